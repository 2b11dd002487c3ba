//! Blendshape index → parameter name table
//!
//! FaceCap sends blendshape weights as `/W <index> <value>`. The index order
//! follows the ARKit face tracking set, with the last three slots carrying
//! head rotation axes.

use std::borrow::Cow;

/// Canonical parameter names, indexed by blendshape index
pub const BLENDSHAPE_NAMES: [&str; 55] = [
    "browDown_L",
    "browDown_R",
    "browInnerUp",
    "browOuterUp_L",
    "browOuterUp_R",
    "eyeLookUp_L",
    "eyeLookUp_R",
    "eyeLookDown_L",
    "eyeLookDown_R",
    "eyeLookIn_L",
    "eyeLookIn_R",
    "eyeLookOut_L",
    "eyeLookOut_R",
    "eyeBlink_L",
    "eyeBlink_R",
    "eyeSquint_L",
    "eyeSquint_R",
    "eyeWide_L",
    "eyeWide_R",
    "cheekPuff",
    "cheekSquint_L",
    "cheekSquint_R",
    "noseSneer_L",
    "noseSneer_R",
    "mouthOpen",
    "jawForward",
    "jawLeft",
    "jawRight",
    "mouthFunnel",
    "mouthPucker",
    "mouthLeft",
    "mouthRight",
    "mouthRollUpper",
    "mouthRollLower",
    "mouthShrugUpper",
    "mouthShrugLower",
    "mouthClose",
    "mouthSmile_L",
    "mouthSmile_R",
    "mouthFrown_L",
    "mouthFrown_R",
    "mouthDimple_L",
    "mouthDimple_R",
    "mouthUpperUp_L",
    "mouthUpperUp_R",
    "mouthLowerDown_L",
    "mouthLowerDown_R",
    "mouthPress_L",
    "mouthPress_R",
    "mouthStretch_L",
    "mouthStretch_R",
    "tongueOut",
    "headYaw",
    "headPitch",
    "headRoll",
];

/// Prefix used for indices outside the known table
pub const FALLBACK_PREFIX: &str = "Blendshape_";

/// Resolve a blendshape index to its parameter name.
///
/// Unknown indices (negative or past the table) are not dropped; they map to
/// `Blendshape_<index>` so downstream consumers can decide what to ignore.
pub fn name_of(index: i64) -> Cow<'static, str> {
    usize::try_from(index)
        .ok()
        .and_then(|i| BLENDSHAPE_NAMES.get(i))
        .map(|name| Cow::Borrowed(*name))
        .unwrap_or_else(|| Cow::Owned(format!("{FALLBACK_PREFIX}{index}")))
}
