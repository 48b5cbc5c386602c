//! Static prompt suggestions shown before (or instead of) model-generated ones.

pub const DEFAULT_SUGGESTIONS: [&str; 8] = [
    "Isolate subject on a clean white studio background",
    "Enhance lighting with dramatic cinematic contrast",
    "Convert to high-contrast monochrome editorial style",
    "Apply professional color grading with warm tones",
    "Replace background with a blurred modern office",
    "Transform into a flat vector art illustration",
    "Add soft volumetric fog and mood lighting",
    "Remove all text and distractive elements",
];

pub fn default_suggestions() -> Vec<String> {
    DEFAULT_SUGGESTIONS.iter().map(ToString::to_string).collect()
}
