#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AspectRatioSpec {
    pub ratio: &'static str,
    pub width: u32,
    pub height: u32,
    pub description: &'static str,
}

pub const DEFAULT_ASPECT_RATIO: &str = "1:1";

/// Baseline output dimensions per aspect ratio. These are what gets reported,
/// regardless of any resolution tier applied to the request.
pub const ASPECT_RATIOS: [AspectRatioSpec; 10] = [
    AspectRatioSpec {
        ratio: "1:1",
        width: 1024,
        height: 1024,
        description: "Square (Instagram post, social media)",
    },
    AspectRatioSpec {
        ratio: "16:9",
        width: 1344,
        height: 768,
        description: "Widescreen (YouTube thumbnail, desktop)",
    },
    AspectRatioSpec {
        ratio: "9:16",
        width: 768,
        height: 1344,
        description: "Vertical (Instagram story, TikTok, mobile)",
    },
    AspectRatioSpec {
        ratio: "4:3",
        width: 1184,
        height: 864,
        description: "Traditional (classic photography)",
    },
    AspectRatioSpec {
        ratio: "3:4",
        width: 864,
        height: 1184,
        description: "Portrait orientation",
    },
    AspectRatioSpec {
        ratio: "3:2",
        width: 1248,
        height: 832,
        description: "DSLR photography",
    },
    AspectRatioSpec {
        ratio: "2:3",
        width: 832,
        height: 1248,
        description: "Portrait photography",
    },
    AspectRatioSpec {
        ratio: "21:9",
        width: 1536,
        height: 672,
        description: "Cinematic (ultra-wide)",
    },
    AspectRatioSpec {
        ratio: "4:5",
        width: 896,
        height: 1152,
        description: "Instagram portrait",
    },
    AspectRatioSpec {
        ratio: "5:4",
        width: 1152,
        height: 896,
        description: "Medium format photography",
    },
];

pub fn is_supported_aspect_ratio(ratio: &str) -> bool {
    aspect_ratio_dimensions(ratio).is_some()
}

pub fn aspect_ratio_dimensions(ratio: &str) -> Option<(u32, u32)> {
    ASPECT_RATIOS
        .iter()
        .find(|spec| spec.ratio == ratio)
        .map(|spec| (spec.width, spec.height))
}

pub fn format_resolution(ratio: &str) -> String {
    match aspect_ratio_dimensions(ratio) {
        Some((width, height)) => format!("{width}x{height}"),
        None => "unknown".to_string(),
    }
}
