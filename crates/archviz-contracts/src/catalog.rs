//! Option tables offered by every workflow form.
//!
//! Labels are shown to the user (English / Burmese); values are the fragments injected into the
//! assembled prompt. Tables are ordered, and the first entry is the default selection.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PromptOption {
    pub label: &'static str,
    pub value: &'static str,
}

impl PromptOption {
    pub const fn new(label: &'static str, value: &'static str) -> Self {
        Self { label, value }
    }

    /// Options whose display text doubles as the prompt fragment.
    pub const fn same(label: &'static str) -> Self {
        Self {
            label,
            value: label,
        }
    }

    pub fn english(&self) -> &'static str {
        english_part(self.label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionCategory {
    Style,
    Context,
    Lighting,
    Tone,
    RoomType,
    RoomStyle,
    InteriorPreset,
    FloorplanView,
    Angle,
    FloorplanAngle,
    TimeOfDay,
    MapTime,
    MapAngle,
}

impl OptionCategory {
    pub const ALL: [OptionCategory; 13] = [
        OptionCategory::Style,
        OptionCategory::Context,
        OptionCategory::Lighting,
        OptionCategory::Tone,
        OptionCategory::RoomType,
        OptionCategory::RoomStyle,
        OptionCategory::InteriorPreset,
        OptionCategory::FloorplanView,
        OptionCategory::Angle,
        OptionCategory::FloorplanAngle,
        OptionCategory::TimeOfDay,
        OptionCategory::MapTime,
        OptionCategory::MapAngle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OptionCategory::Style => "style",
            OptionCategory::Context => "context",
            OptionCategory::Lighting => "lighting",
            OptionCategory::Tone => "tone",
            OptionCategory::RoomType => "room_type",
            OptionCategory::RoomStyle => "room_style",
            OptionCategory::InteriorPreset => "interior_preset",
            OptionCategory::FloorplanView => "floorplan_view",
            OptionCategory::Angle => "angle",
            OptionCategory::FloorplanAngle => "floorplan_angle",
            OptionCategory::TimeOfDay => "time_of_day",
            OptionCategory::MapTime => "map_time",
            OptionCategory::MapAngle => "map_angle",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|category| category.name() == normalized)
    }

    pub fn options(self) -> &'static [PromptOption] {
        match self {
            OptionCategory::Style => STYLES,
            OptionCategory::Context => CONTEXTS,
            OptionCategory::Lighting => LIGHTINGS,
            OptionCategory::Tone => TONES,
            OptionCategory::RoomType => ROOM_TYPES,
            OptionCategory::RoomStyle => ROOM_STYLES,
            OptionCategory::InteriorPreset => INTERIOR_PRESETS,
            OptionCategory::FloorplanView => FLOORPLAN_VIEWS,
            OptionCategory::Angle => ANGLES,
            OptionCategory::FloorplanAngle => FLOORPLAN_ANGLES,
            OptionCategory::TimeOfDay => TIMES_OF_DAY,
            OptionCategory::MapTime => MAP_TIMES,
            OptionCategory::MapAngle => MAP_ANGLES,
        }
    }

    pub fn default_option(self) -> PromptOption {
        self.options()[0]
    }

    /// Resolves user input against this category.
    ///
    /// Accepted forms, all case-insensitive: the full label, the English half of the label, the
    /// prompt value, or a 1-based position.
    pub fn find(self, query: &str) -> Option<PromptOption> {
        let needle = query.trim();
        if needle.is_empty() {
            return None;
        }
        let options = self.options();
        if let Ok(position) = needle.parse::<usize>() {
            return position
                .checked_sub(1)
                .and_then(|idx| options.get(idx))
                .copied();
        }
        options
            .iter()
            .find(|option| {
                option.label.trim().eq_ignore_ascii_case(needle)
                    || option.english().eq_ignore_ascii_case(needle)
                    || option.value.eq_ignore_ascii_case(needle)
            })
            .copied()
    }

    pub fn contains(self, option: &PromptOption) -> bool {
        self.options().iter().any(|candidate| candidate == option)
    }
}

/// Text before the first `/` of a bilingual label, trimmed.
pub fn english_part(label: &str) -> &str {
    label.split('/').next().unwrap_or(label).trim()
}

pub const STYLES: &[PromptOption] = &[
    PromptOption::new(
        "Photorealistic / လက်တွေ့ဆန်သော",
        "Hyper-realistic real estate photography, 8k resolution, highly detailed textures",
    ),
    PromptOption::new(
        "V-Ray Render / 3D Render ပုံစံ",
        "High-end V-Ray architectural render, global illumination, raytracing",
    ),
    PromptOption::new(
        "Modern Minimalist / ခေတ်မီရိုးရှင်းသော",
        "Modern minimalist architecture, clean lines, white and wood materials",
    ),
    PromptOption::new(
        "Cinematic / ရုပ်ရှင်ဆန်သော",
        "Cinematic architectural shot, dramatic lighting, movie scene look",
    ),
    PromptOption::new(
        "Sketch / ခဲပန်းချီ",
        "Architectural pencil sketch, hand-drawn style, white paper",
    ),
];

pub const CONTEXTS: &[PromptOption] = &[
    PromptOption::new(
        "High-end Urban / မြို့ပြအဆင့်မြင့်ရပ်ကွက်",
        "in a high-end modern urban city area with clean streets, luxury shops, and manicured landscaping",
    ),
    PromptOption::new(
        "Busy Street / လမ်းမကြီးဘေး",
        "on a busy street with asphalt roads, street lights, sidewalks, and city traffic",
    ),
    PromptOption::new(
        "Rural Landscape / ကျေးလက်ဒေသ",
        "in a peaceful rural landscape with open fields, nature, and distant hills",
    ),
    PromptOption::new(
        "Tropical Garden / အပူပိုင်းဥယျာဉ်",
        "surrounded by lush tropical vegetation, palm trees, and vibrant garden plants",
    ),
    PromptOption::new(
        "Riverside / မြစ်ကမ်းဘေး",
        "situated next to a calm river with water reflections and a promenade",
    ),
    PromptOption::new(
        "Beachfront / ကမ်းခြေ",
        "on a sunny beachfront with ocean view and sandy terrain",
    ),
    PromptOption::new(
        "Mountain / တောင်ပေါ်",
        "in a mountainous area with misty background and rocky terrain",
    ),
];

pub const LIGHTINGS: &[PromptOption] = &[
    PromptOption::new(
        "Natural Daylight / သဘာဝအလင်းရောင်",
        "soft natural daylight entering through windows, balanced white balance, airy atmosphere",
    ),
    PromptOption::new(
        "Warm Artificial / အခန်းတွင်းမီးရောင် (Warm)",
        "warm artificial interior lighting, cozy atmosphere, tungsten light temperature (3000K)",
    ),
    PromptOption::new(
        "Cold Modern / ခေတ်မီအလင်းရောင် (Cool)",
        "cool modern lighting, bright white LED strips, clean and sterile atmosphere (6000K)",
    ),
    PromptOption::new(
        "Golden Hour / နေဝင်ဆည်းဆာ",
        "golden hour sunbeams hitting the interior, dramatic warm shadows, emotional lighting",
    ),
    PromptOption::new(
        "Luxury Dark / ဇိမ်ခံအမှောင်",
        "dimly lit luxury atmosphere, moody accent lighting, spot lights on features, high contrast",
    ),
    PromptOption::new(
        "Overcast / တိမ်အုံ့ (ပျော့ပျောင်း)",
        "soft diffused overcast light, no harsh shadows, even illumination",
    ),
];

pub const TONES: &[PromptOption] = &[
    PromptOption::new(
        "Natural / သဘာဝ",
        "natural true-to-life colors, balanced contrast, realistic photography",
    ),
    PromptOption::new(
        "Cinematic / ရုပ်ရှင်ဆန်ဆန်",
        "cinematic color grading, teal and orange hints, high contrast",
    ),
    PromptOption::new(
        "Warm & Cozy / နွေးထွေးသော",
        "warm color temperature, inviting atmosphere, soft yellow tones",
    ),
    PromptOption::new(
        "Modern Cold / အေးမြသော",
        "cool blue tones, crisp white balance, modern sterile look",
    ),
    PromptOption::new(
        "Vintage / ရှေးဟောင်း",
        "vintage film look, slight grain, retro color palette",
    ),
    PromptOption::new(
        "Vibrant / တောက်ပသော",
        "vibrant saturated colors, punchy contrast, architectural magazine style",
    ),
];

pub const ROOM_TYPES: &[PromptOption] = &[
    PromptOption::new(
        "Living Room / ဧည့်ခန်း",
        "Living Room",
    ),
    PromptOption::new(
        "Bedroom / အိပ်ခန်း",
        "Master Bedroom",
    ),
    PromptOption::new(
        "Kitchen / မီးဖိုချောင်",
        "Modern Kitchen",
    ),
    PromptOption::new(
        "Dining Room / ထမင်းစားခန်း",
        "Dining Room",
    ),
    PromptOption::new(
        "Bathroom / ရေချိုးခန်း",
        "Luxury Bathroom",
    ),
    PromptOption::new(
        "Home Office / ရုံးခန်း",
        "Home Office",
    ),
    PromptOption::new(
        "Coffee Shop / ကော်ဖီဆိုင်",
        "Coffee Shop Interior",
    ),
    PromptOption::new(
        "Retail Store / ဆိုင်ခန်း",
        "Retail Store Interior",
    ),
    PromptOption::new(
        "Hotel Lobby / ဟိုတယ်ဧည့်ခန်း",
        "Hotel Lobby",
    ),
    PromptOption::new(
        "Meeting Room / အစည်းအဝေးခန်း",
        "Conference Room",
    ),
];

pub const ROOM_STYLES: &[PromptOption] = &[
    PromptOption::new(
        "Modern / ခေတ်မီ",
        "Modern Contemporary interior design, sleek furniture, clean lines, neutral color palette with bold accents, open space",
    ),
    PromptOption::new(
        "Neoclassical / နီယိုဂန္ထဝင်",
        "Neoclassical interior design, elegant wall moldings, crystal chandeliers, velvet furniture, symmetry, gold and beige tones, luxury classic",
    ),
    PromptOption::new(
        "Minimalist / ရိုးရှင်း (Minimalist)",
        "Minimalist interior design, \"less is more\", white walls, natural light wood, functional uncluttered space, zen atmosphere",
    ),
    PromptOption::new(
        "Luxury / ဇိမ်ခံ (Luxury)",
        "Ultra-Luxury interior design, italian marble floors, expensive designer furniture, gold and brass metal accents, sophisticated lighting",
    ),
    PromptOption::new(
        "Indochine / အင်ဒိုချိုင်းနား",
        "Indochine interior style, tropical hardwoods, rattan furniture, french colonial influence, encaustic cement tiles, yellow and green tones",
    ),
    PromptOption::new(
        "Scandinavian / စကင်ဒီနေးဗီးယန်း",
        "Scandinavian interior design, hygge, light oak wood floors, white walls, soft textiles, pastel colors, bright and airy",
    ),
    PromptOption::new(
        "Industrial / စက်မှုပုံစံ (Loft)",
        "Industrial Loft interior design, exposed brick walls, concrete floors, ductwork, black metal window frames, leather furniture, raw",
    ),
    PromptOption::new(
        "Wabi-Sabi / ဝါဘိဆာဘိ",
        "Wabi-Sabi interior design, beauty in imperfection, rough raw plastered walls, natural stone, organic shapes, earthy muted tones",
    ),
    PromptOption::new(
        "Japandi / ဂျပန်-စကင်ဒီ",
        "Japandi interior design, blend of Japanese rustic minimalism and Scandinavian functionality, clean lines, bright spaces, natural materials",
    ),
    PromptOption::new(
        "Bohemian / ဘိုဟီးမီးယန်း",
        "Bohemian interior design, eclectic patterns, macrame, many plants, layered rugs, warm earth tones, relaxed atmosphere",
    ),
    PromptOption::new(
        "Coastal / ကမ်းခြေ",
        "Coastal interior design, beach house vibe, light blue and white palette, linen fabrics, natural light, breezy",
    ),
    PromptOption::new(
        "Art Deco / အာ့ဒက်ကို",
        "Art Deco interior design, geometric patterns, bold jewel tones, gold and chrome metals, velvet, glamourous",
    ),
];

pub const INTERIOR_PRESETS: &[PromptOption] = &[
    PromptOption::new(
        "Real Estate Photography / အိမ်ခြံမြေ ဓာတ်ပုံ",
        "High-end real estate photography, wide angle, bright and airy, crystal clear, 8k, architectural digest style",
    ),
    PromptOption::new(
        "Cinematic Atmosphere / ရုပ်ရှင်ဆန်သော",
        "Cinematic interior shot, dramatic lighting, depth of field, emotional atmosphere, movie set quality",
    ),
    PromptOption::new(
        "3D Visualization (V-Ray) / 3D ဒီဇိုင်း",
        "Professional 3D rendering, V-Ray style, perfect material reflections, clean geometry, CGI",
    ),
    PromptOption::new(
        "Cozy Home / နွေးထွေးသော အိမ်",
        "Warm and cozy home atmosphere, lived-in feel, soft lighting, inviting composition",
    ),
    PromptOption::new(
        "Luxury Editorial / ဇိမ်ခံ မဂ္ဂဇင်း",
        "Luxury architectural magazine editorial, moody lighting, high contrast, expensive materials, detail oriented",
    ),
];

pub const FLOORPLAN_VIEWS: &[PromptOption] = &[
    PromptOption::new(
        "Realistic Perspective / မျက်မြင်အမြင် (Perspective)",
        "eye-level interior perspective view, standing inside the room",
    ),
    PromptOption::new(
        "Isometric 3D / 3D အပေါ်စီးမြင်ကွင်း",
        "isometric 3D floorplan view, cutaway walls, top-down angle",
    ),
    PromptOption::new(
        "Top Down Plan / အပေါ်စီးဘလန် (Color)",
        "2D colored architectural plan, textured flooring, furniture symbols",
    ),
];

pub const ANGLES: &[PromptOption] = &[
    PromptOption::same("Perspective View / ဘေးစောင်း"),
    PromptOption::same("Frontal View / အရှေ့တည့်တည့်"),
    PromptOption::same("Bird's Eye View / အပေါ်စီး"),
    PromptOption::same("Ground Level / မြေပြင်အဆင့်"),
    PromptOption::same("Interior Close-up / အနီးကပ်"),
];

pub const FLOORPLAN_ANGLES: &[PromptOption] = &[
    PromptOption::same("Top-down View / အပေါ်တည့်တည့်"),
    PromptOption::same("Perspective Axis / ဘေးစောင်း 3D"),
    PromptOption::same("3D Axonometric / အနားစောင်း 3D"),
];

pub const TIMES_OF_DAY: &[PromptOption] = &[
    PromptOption::same("Bright Daylight / နေ့ခင်းဘက်"),
    PromptOption::same("Golden Hour / နေဝင်ဆည်းဆာ"),
    PromptOption::same("Blue Hour / မှောင်ရီပျိုးစ"),
    PromptOption::same("Overcast / တိမ်ဖုံးနေသော"),
    PromptOption::same("Night / ညဘက်"),
];

pub const MAP_TIMES: &[PromptOption] = &[
    PromptOption::same("Day / နေ့လည်ခင်း"),
    PromptOption::same("Morning / မနက်ခင်း"),
    PromptOption::same("Evening / ညနေခင်း"),
    PromptOption::same("Night / ညဘက်"),
];

pub const MAP_ANGLES: &[PromptOption] = &[
    PromptOption::same("Bird's Eye View (45°) / အပေါ်စီး ၄၅ ဒီဂရီ"),
    PromptOption::same("Top Down (90°) / အပေါ်တည့်တည့်"),
    PromptOption::same("Drone High Angle / ဒရုန်း အမြင့်ရိုက်ချက်"),
    PromptOption::same("Cinematic Low Angle / အနိမ့်ရိုက်ချက်"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UtilitySpec {
    pub id: &'static str,
    pub title: &'static str,
    pub burmese: &'static str,
    pub description: &'static str,
}

pub const UTILITIES: &[UtilitySpec] = &[
    UtilitySpec {
        id: "MapTo3D",
        title: "Google Map to 3D",
        burmese: "Google Map မှ 3D သို့",
        description: "Transform map screenshots into realistic 3D landscapes.",
    },
    UtilitySpec {
        id: "InsertBuilding",
        title: "Insert Building",
        burmese: "အဆောက်အဦးထည့်သွင်းရန်",
        description: "Place architectural models into real-world site photos.",
    },
    UtilitySpec {
        id: "VirtualTour",
        title: "Virtual Tour",
        burmese: "Virtual Tour ကြည့်ရန်",
        description: "Generate immersive 360 views and camera transitions.",
    },
    UtilitySpec {
        id: "FurniturePlacement",
        title: "Furniture Placement",
        burmese: "ပရိဘောဂ နေရာချရန်",
        description: "Automatically furnish empty rooms using moodboards.",
    },
    UtilitySpec {
        id: "FillFloorplan",
        title: "Fill 2D Floorplan",
        burmese: "2D ပုံစံ အရောင်ဖြည့်ရန်",
        description: "Apply professional materials and colors to 2D drawings.",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MapPreset {
    pub id: &'static str,
    pub label: &'static str,
    pub prompt: &'static str,
}

pub const MAP_PRESETS: &[MapPreset] = &[
    MapPreset {
        id: "coastal",
        label: "Coastal / ကမ်းခြေ",
        prompt: "Photorealistic aerial view of a coastal area, deep blue ocean with realistic water caustics and reflections, white sandy beaches, dense tropical vegetation, 3D buildings, cinematic lighting, high detailed terrain elevation.",
    },
    MapPreset {
        id: "urban",
        label: "Urban / မြို့ပြ",
        prompt: "Dense urban cityscape, modern high-rise buildings with glass facades, busy road networks with traffic, city parks, realistic shadows from skyscrapers, golden hour lighting, detailed 3D city model.",
    },
    MapPreset {
        id: "rural",
        label: "Rural / ကျေးလက်",
        prompt: "Lush green rural landscape, rolling hills, organic agricultural fields, scattered small houses, winding rivers with reflective water, dense forests, soft morning mist, photorealistic nature photography style.",
    },
    MapPreset {
        id: "lake",
        label: "Lakeside / ကန်ဘောင်",
        prompt: "Serene lakeside view, large body of water with reflections, surrounding lush forests and parklands, residential buildings near the shore, clear blue sky, peaceful atmosphere, high fidelity 3D environment.",
    },
];

pub fn map_preset(id: &str) -> Option<&'static MapPreset> {
    let needle = id.trim();
    MAP_PRESETS
        .iter()
        .find(|preset| preset.id.eq_ignore_ascii_case(needle))
}

pub const MAP_TO_3D_DEFAULT_PROMPT: &str = concat!(
    "A hyper-realistic, cinematic drone photograph based strictly on the geography and layout of the provided satellite image. Transform the flat, top-down satellite view into a slight oblique angle (high-angle shot) to create three-dimensional depth.\n",
    "The ground should not look flat; it must show realistic elevation changes and topography based on the image's features. Apply dramatic [Golden Hour sunrise/sunset)] lighting.\n",
    "The low sun angle must cast long, distinct, directional shadows from every tree, building, and hill, defining their shapes on the ground. The light should be warm and rich. Add atmospheric haze and perspective, making distant elements slightly bluer and softer.\n",
    "Enhance environmental textures: trees must be volumetric with individual leaves, water surfaces must be reflective, and roads/buildings must show realistic weathering and material textures.\n",
    "Shot on a high-resolution aerial cinema camera. incredible detail, sharp focus across the frame, natural cinematic color grading. Remove any text that was placed in google earth.",
);
