use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::catalog::{english_part, OptionCategory, UTILITIES};
use crate::models::{AspectRatio, Resolution};
use crate::selection::WorkflowSelection;

pub const DEFAULT_VIDEO_PROMPT: &str =
    "Cinematic architectural flythrough of this building, hyper-realistic, 8k, smooth motion, natural lighting.";

const RENDER_HISTORY_SLUG: &str = "render";

/// Workflow slugs that own a history list.
pub const HISTORY_SLUGS: &[&str] = &["render", "improve", "upscale", "edit", "utilities", "video"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EditMode {
    General,
    Replace,
    Add,
    Material,
    Notes,
}

impl EditMode {
    pub const ALL: [EditMode; 5] = [
        EditMode::General,
        EditMode::Replace,
        EditMode::Add,
        EditMode::Material,
        EditMode::Notes,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EditMode::General => "general",
            EditMode::Replace => "replace",
            EditMode::Add => "add",
            EditMode::Material => "material",
            EditMode::Notes => "notes",
        }
    }
}

impl FromStr for EditMode {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| format!("unknown edit mode '{raw}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UtilityKind {
    MapTo3D,
    InsertBuilding,
    VirtualTour,
    FurniturePlacement,
    FillFloorplan,
}

impl UtilityKind {
    pub const ALL: [UtilityKind; 5] = [
        UtilityKind::MapTo3D,
        UtilityKind::InsertBuilding,
        UtilityKind::VirtualTour,
        UtilityKind::FurniturePlacement,
        UtilityKind::FillFloorplan,
    ];

    pub fn id(self) -> &'static str {
        match self {
            UtilityKind::MapTo3D => "MapTo3D",
            UtilityKind::InsertBuilding => "InsertBuilding",
            UtilityKind::VirtualTour => "VirtualTour",
            UtilityKind::FurniturePlacement => "FurniturePlacement",
            UtilityKind::FillFloorplan => "FillFloorplan",
        }
    }

    pub fn title(self) -> &'static str {
        self.spec().map(|spec| spec.title).unwrap_or(self.id())
    }

    pub fn description(self) -> &'static str {
        self.spec().map(|spec| spec.description).unwrap_or("")
    }

    fn spec(self) -> Option<&'static crate::catalog::UtilitySpec> {
        UTILITIES.iter().find(|spec| spec.id == self.id())
    }
}

impl FromStr for UtilityKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized: String = raw
            .trim()
            .chars()
            .filter(|ch| ch.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.id().to_ascii_lowercase() == normalized)
            .ok_or_else(|| format!("unknown utility '{raw}'"))
    }
}

/// Generation mode. Each variant owns exactly one prompt template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WorkflowKind {
    Exterior,
    Interior,
    Floorplan3D,
    Floorplan3DAxonometric,
    Masterplan,
    Improve { intensity: u8, resolution: Resolution },
    Upscale { resolution: Resolution },
    Edit(EditMode),
    Utility(UtilityKind),
    Video,
}

impl WorkflowKind {
    /// Parses the render modes offered on the render tab.
    pub fn parse_render_mode(raw: &str) -> Result<Self, String> {
        let normalized: String = raw
            .trim()
            .chars()
            .filter(|ch| ch.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "exterior" => Ok(WorkflowKind::Exterior),
            "interior" => Ok(WorkflowKind::Interior),
            "floorplan3d" | "floorplanto3d" => Ok(WorkflowKind::Floorplan3D),
            "3dfloorplan" => Ok(WorkflowKind::Floorplan3DAxonometric),
            "masterplan" => Ok(WorkflowKind::Masterplan),
            _ => Err(format!(
                "unknown render mode '{raw}' (expected exterior, interior, floorplan3d, 3d-floorplan or masterplan)"
            )),
        }
    }

    pub fn mode_id(&self) -> &'static str {
        match self {
            WorkflowKind::Exterior => "Exterior",
            WorkflowKind::Interior => "Interior",
            WorkflowKind::Floorplan3D => "Floorplan3D",
            WorkflowKind::Floorplan3DAxonometric => "3DFloorplan",
            WorkflowKind::Masterplan => "Masterplan",
            WorkflowKind::Improve { .. } => "Improve",
            WorkflowKind::Upscale { .. } => "Upscale",
            WorkflowKind::Edit(_) => "Edit",
            WorkflowKind::Utility(kind) => kind.id(),
            WorkflowKind::Video => "Video",
        }
    }

    pub fn is_render(&self) -> bool {
        matches!(
            self,
            WorkflowKind::Exterior
                | WorkflowKind::Interior
                | WorkflowKind::Floorplan3D
                | WorkflowKind::Floorplan3DAxonometric
                | WorkflowKind::Masterplan
        )
    }

    pub fn is_floorplan(&self) -> bool {
        matches!(
            self,
            WorkflowKind::Floorplan3D | WorkflowKind::Floorplan3DAxonometric
        )
    }

    pub fn history_slug(&self) -> &'static str {
        match self {
            kind if kind.is_render() => RENDER_HISTORY_SLUG,
            WorkflowKind::Improve { .. } => "improve",
            WorkflowKind::Upscale { .. } => "upscale",
            WorkflowKind::Edit(_) => "edit",
            WorkflowKind::Utility(_) => "utilities",
            _ => "video",
        }
    }

    /// Local-store key of this workflow's history list.
    pub fn history_key(&self) -> String {
        history_key_for_slug(self.history_slug())
    }

    pub fn default_aspect_ratio(&self) -> AspectRatio {
        match self {
            WorkflowKind::Improve { .. } | WorkflowKind::Upscale { .. } | WorkflowKind::Edit(_) => {
                AspectRatio::Square
            }
            WorkflowKind::Video => AspectRatio::Wide16x9,
            _ => AspectRatio::Landscape4x3,
        }
    }

    pub fn requires_free_text(&self) -> bool {
        matches!(self, WorkflowKind::Edit(_))
    }

    /// Resolution fixed by the mode itself; overrides the caller's choice.
    pub fn resolution(&self) -> Option<Resolution> {
        match self {
            WorkflowKind::Improve { resolution, .. } | WorkflowKind::Upscale { resolution } => {
                Some(*resolution)
            }
            _ => None,
        }
    }

    /// Prompt recorded in history for a result produced from `prompt`.
    pub fn history_label(&self, prompt: &str) -> String {
        match self {
            WorkflowKind::Improve { .. } => "Improve Render Enhancement".to_string(),
            WorkflowKind::Upscale { .. } => "Deep Upscale Result".to_string(),
            _ => prompt.to_string(),
        }
    }

    /// Task context handed to image analysis, if the workflow offers auto-detection.
    pub fn analysis_context(&self) -> Option<String> {
        match self {
            kind if kind.is_floorplan() => Some(format!(
                "This is a floorplan visualization. Mode: {}. Analyze the layout and suggest a 3D conversion.",
                kind.mode_id()
            )),
            WorkflowKind::Interior => Some(
                "Analyze this interior space. Identify the room function, furniture style, materials, and lighting."
                    .to_string(),
            ),
            WorkflowKind::Exterior | WorkflowKind::Masterplan => Some(
                "This is an architectural exterior. Analyze the building style, facade materials, surroundings, and lighting conditions."
                    .to_string(),
            ),
            WorkflowKind::Utility(UtilityKind::MapTo3D) => Some(
                "Analyze this Google Map screenshot. Identify the terrain type, vegetation density (forests, trees), water bodies (sea, rivers, lakes), road networks, and building density. Describe the scene geography in high detail to serve as a base for a 3D heightmap and photorealistic aerial render."
                    .to_string(),
            ),
            WorkflowKind::Utility(kind) => Some(format!(
                "Specialized architectural utility: {}. Input image analysis required for transformation.",
                kind.title()
            )),
            _ => None,
        }
    }
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowKind::Edit(mode) => write!(f, "Edit({})", mode.as_str()),
            other => f.write_str(other.mode_id()),
        }
    }
}

pub fn history_key_for_slug(slug: &str) -> String {
    format!("archi_{slug}_history")
}

/// Builds the instruction sent to the image model. Pure: identical inputs give identical text.
pub fn assemble(kind: WorkflowKind, selections: &WorkflowSelection, free_text: &str) -> String {
    match kind {
        WorkflowKind::Exterior | WorkflowKind::Masterplan => exterior_prompt(selections, free_text),
        WorkflowKind::Interior => interior_prompt(selections, free_text),
        WorkflowKind::Floorplan3D | WorkflowKind::Floorplan3DAxonometric => {
            floorplan_prompt(selections, free_text)
        }
        WorkflowKind::Improve {
            intensity,
            resolution,
        } => improve_prompt(intensity, resolution),
        WorkflowKind::Upscale { resolution } => upscale_prompt(resolution),
        WorkflowKind::Edit(mode) => edit_prompt(mode, free_text),
        WorkflowKind::Utility(kind) => utility_prompt(kind, selections, free_text),
        WorkflowKind::Video => video_prompt(free_text),
    }
}

fn or_default<'a>(text: &'a str, fallback: &'a str) -> &'a str {
    if text.is_empty() {
        fallback
    } else {
        text
    }
}

fn exterior_prompt(selections: &WorkflowSelection, free_text: &str) -> String {
    format!(
        "Professional architectural visualization of {}. Style: {}. Context: {}. Lighting: {}. Color Tone: {}. Camera: {}. 8k resolution, highly detailed, photorealistic, cinematic composition.",
        or_default(free_text, "a building"),
        selections.value(OptionCategory::Style),
        selections.value(OptionCategory::Context),
        selections.value(OptionCategory::Lighting),
        selections.value(OptionCategory::Tone),
        selections.value(OptionCategory::Angle),
    )
}

fn interior_prompt(selections: &WorkflowSelection, free_text: &str) -> String {
    format!(
        "[{}]. Professional interior design of a {}. Architectural Style: {}. Lighting: {}. Mood: {}. Additional details: {}.",
        selections.value(OptionCategory::InteriorPreset),
        selections.value(OptionCategory::RoomType),
        selections.value(OptionCategory::RoomStyle),
        selections.value(OptionCategory::Lighting),
        selections.value(OptionCategory::Tone),
        free_text,
    )
}

fn floorplan_prompt(selections: &WorkflowSelection, free_text: &str) -> String {
    format!(
        "Transform this 2D floorplan line drawing into a photorealistic 3D visualization. View Mode: {}. Target Room: {}. Interior Design Style: {}. Materials and Details: {}. The output must be a fully furnished, lighted, and textured rendering of the room specified, respecting the structural layout of the source plan.",
        selections.value(OptionCategory::FloorplanView),
        selections.value(OptionCategory::RoomType),
        selections.value(OptionCategory::RoomStyle),
        free_text,
    )
}

fn improve_prompt(intensity: u8, resolution: Resolution) -> String {
    format!(
        "Highly detailed photorealistic architectural enhancement. Resolution: {resolution}. Improve textures, fix lighting, premium materials. Intensity: {intensity}%"
    )
}

fn upscale_prompt(resolution: Resolution) -> String {
    format!(
        "Deep architectural upscale to {resolution}. Ultra-clean 4k+ presentation grade. Sharp textures and structural lines."
    )
}

fn edit_prompt(mode: EditMode, free_text: &str) -> String {
    match mode {
        EditMode::General | EditMode::Notes => free_text.to_string(),
        EditMode::Replace => format!(
            "Architectural model replacement: {free_text}. Maintain same lighting and perspective."
        ),
        EditMode::Add => format!(
            "Architectural addition: Precisely add {free_text} into the scene. High realism."
        ),
        EditMode::Material => format!(
            "Architectural material swap: Change {free_text}. Keep architectural integrity."
        ),
    }
}

fn utility_prompt(kind: UtilityKind, selections: &WorkflowSelection, free_text: &str) -> String {
    let details = or_default(free_text, kind.description());
    match kind {
        UtilityKind::MapTo3D => format!(
            "[GOOGLE MAP TO 3D REALISM] Transform this 2D map satellite view into a realistic 3D world. Perspective: {}. Lighting: {}. Scene details: {}. Render high quality water reflections, 3d buildings, volumetric trees, accurate elevation. Cinematic 8k aerial photography.",
            english_part(selections.value(OptionCategory::MapAngle)),
            english_part(selections.value(OptionCategory::MapTime)),
            details,
        ),
        other => format!(
            "[MODE: {}] {details}. High fidelity render, photorealistic, cinematic lighting.",
            other.id()
        ),
    }
}

fn video_prompt(free_text: &str) -> String {
    or_default(free_text, DEFAULT_VIDEO_PROMPT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exterior_scenario() -> anyhow::Result<WorkflowSelection> {
        Ok(WorkflowSelection::new()
            .with(OptionCategory::Style, "Modern Minimalist")?
            .with(OptionCategory::Context, "Rural Landscape")?
            .with(OptionCategory::Lighting, "Golden Hour")?
            .with(OptionCategory::Tone, "Natural")?
            .with(OptionCategory::Angle, "Perspective View")?)
    }

    #[test]
    fn exterior_scenario_matches_expected_text() -> anyhow::Result<()> {
        let selections = exterior_scenario()?;
        let prompt = assemble(WorkflowKind::Exterior, &selections, "2 storey house");
        assert_eq!(
            prompt,
            "Professional architectural visualization of 2 storey house. Style: Modern minimalist architecture, clean lines, white and wood materials. Context: in a peaceful rural landscape with open fields, nature, and distant hills. Lighting: golden hour sunbeams hitting the interior, dramatic warm shadows, emotional lighting. Color Tone: natural true-to-life colors, balanced contrast, realistic photography. Camera: Perspective View / ဘေးစောင်း. 8k resolution, highly detailed, photorealistic, cinematic composition."
        );
        Ok(())
    }

    #[test]
    fn assemble_is_deterministic_and_leaves_selection_untouched() -> anyhow::Result<()> {
        let selections = exterior_scenario()?;
        let snapshot = selections.clone();
        let kinds = [
            WorkflowKind::Exterior,
            WorkflowKind::Interior,
            WorkflowKind::Floorplan3D,
            WorkflowKind::Improve {
                intensity: 80,
                resolution: Resolution::TwoK,
            },
            WorkflowKind::Edit(EditMode::Add),
            WorkflowKind::Utility(UtilityKind::MapTo3D),
            WorkflowKind::Video,
        ];
        for kind in kinds {
            let first = assemble(kind, &selections, "glass facade");
            let second = assemble(kind, &selections, "glass facade");
            assert_eq!(first, second, "{kind}");
        }
        assert_eq!(selections, snapshot);
        Ok(())
    }

    #[test]
    fn exterior_defaults_subject_when_free_text_empty() {
        let prompt = assemble(WorkflowKind::Masterplan, &WorkflowSelection::new(), "");
        assert!(prompt.starts_with("Professional architectural visualization of a building. Style: Hyper-realistic"));
    }

    #[test]
    fn interior_uses_preset_room_and_style() {
        let prompt = assemble(WorkflowKind::Interior, &WorkflowSelection::new(), "oak floor");
        assert_eq!(
            prompt,
            "[High-end real estate photography, wide angle, bright and airy, crystal clear, 8k, architectural digest style]. Professional interior design of a Living Room. Architectural Style: Modern Contemporary interior design, sleek furniture, clean lines, neutral color palette with bold accents, open space. Lighting: soft natural daylight entering through windows, balanced white balance, airy atmosphere. Mood: natural true-to-life colors, balanced contrast, realistic photography. Additional details: oak floor."
        );
    }

    #[test]
    fn both_floorplan_modes_share_template() -> anyhow::Result<()> {
        let selections = WorkflowSelection::new()
            .with(OptionCategory::FloorplanView, "Isometric 3D")?
            .with(OptionCategory::RoomType, "Kitchen")?;
        let a = assemble(WorkflowKind::Floorplan3D, &selections, "marble");
        let b = assemble(WorkflowKind::Floorplan3DAxonometric, &selections, "marble");
        assert_eq!(a, b);
        assert!(a.starts_with("Transform this 2D floorplan line drawing into a photorealistic 3D visualization. View Mode: isometric 3D floorplan view, cutaway walls, top-down angle. Target Room: Modern Kitchen."));
        assert!(a.contains("Materials and Details: marble."));
        Ok(())
    }

    #[test]
    fn improve_and_upscale_interpolate_resolution() {
        let selections = WorkflowSelection::new();
        assert_eq!(
            assemble(
                WorkflowKind::Improve {
                    intensity: 75,
                    resolution: Resolution::FourK
                },
                &selections,
                "ignored"
            ),
            "Highly detailed photorealistic architectural enhancement. Resolution: 4K. Improve textures, fix lighting, premium materials. Intensity: 75%"
        );
        assert_eq!(
            assemble(
                WorkflowKind::Upscale {
                    resolution: Resolution::SixK
                },
                &selections,
                ""
            ),
            "Deep architectural upscale to 6K. Ultra-clean 4k+ presentation grade. Sharp textures and structural lines."
        );
    }

    #[test]
    fn edit_modes_wrap_instruction() {
        let selections = WorkflowSelection::new();
        let edit = |mode| assemble(WorkflowKind::Edit(mode), &selections, "a red door");
        assert_eq!(edit(EditMode::General), "a red door");
        assert_eq!(edit(EditMode::Notes), "a red door");
        assert_eq!(
            edit(EditMode::Replace),
            "Architectural model replacement: a red door. Maintain same lighting and perspective."
        );
        assert_eq!(
            edit(EditMode::Add),
            "Architectural addition: Precisely add a red door into the scene. High realism."
        );
        assert_eq!(
            edit(EditMode::Material),
            "Architectural material swap: Change a red door. Keep architectural integrity."
        );
    }

    #[test]
    fn map_to_3d_uses_english_halves_of_time_and_angle() -> anyhow::Result<()> {
        let selections = WorkflowSelection::new()
            .with(OptionCategory::MapTime, "Night")?
            .with(OptionCategory::MapAngle, "Drone High Angle")?;
        let prompt = assemble(WorkflowKind::Utility(UtilityKind::MapTo3D), &selections, "");
        assert_eq!(
            prompt,
            "[GOOGLE MAP TO 3D REALISM] Transform this 2D map satellite view into a realistic 3D world. Perspective: Drone High Angle. Lighting: Night. Scene details: Transform map screenshots into realistic 3D landscapes.. Render high quality water reflections, 3d buildings, volumetric trees, accurate elevation. Cinematic 8k aerial photography."
        );
        Ok(())
    }

    #[test]
    fn other_utilities_use_mode_tag() {
        let prompt = assemble(
            WorkflowKind::Utility(UtilityKind::InsertBuilding),
            &WorkflowSelection::new(),
            "a glass pavilion",
        );
        assert_eq!(
            prompt,
            "[MODE: InsertBuilding] a glass pavilion. High fidelity render, photorealistic, cinematic lighting."
        );
    }

    #[test]
    fn video_prompt_falls_back_to_flythrough() {
        let selections = WorkflowSelection::new();
        assert_eq!(
            assemble(WorkflowKind::Video, &selections, ""),
            DEFAULT_VIDEO_PROMPT
        );
        assert_eq!(
            assemble(WorkflowKind::Video, &selections, "slow drone sweep right"),
            "slow drone sweep right"
        );
    }

    #[test]
    fn render_modes_share_history_key() {
        assert_eq!(WorkflowKind::Exterior.history_key(), "archi_render_history");
        assert_eq!(WorkflowKind::Masterplan.history_key(), "archi_render_history");
        assert_eq!(
            WorkflowKind::Edit(EditMode::Add).history_key(),
            "archi_edit_history"
        );
        assert_eq!(
            WorkflowKind::Utility(UtilityKind::VirtualTour).history_key(),
            "archi_utilities_history"
        );
    }

    #[test]
    fn parses_modes_and_utilities() {
        assert_eq!(
            WorkflowKind::parse_render_mode("3d-floorplan"),
            Ok(WorkflowKind::Floorplan3DAxonometric)
        );
        assert_eq!(
            WorkflowKind::parse_render_mode("Floorplan3D"),
            Ok(WorkflowKind::Floorplan3D)
        );
        assert!(WorkflowKind::parse_render_mode("kitchen").is_err());
        assert_eq!("map-to-3d".parse::<UtilityKind>(), Ok(UtilityKind::MapTo3D));
        assert_eq!(
            "fill_floorplan".parse::<UtilityKind>(),
            Ok(UtilityKind::FillFloorplan)
        );
        assert_eq!("Material".parse::<EditMode>(), Ok(EditMode::Material));
    }

    #[test]
    fn analysis_context_follows_workflow() {
        assert_eq!(
            WorkflowKind::Floorplan3DAxonometric.analysis_context().as_deref(),
            Some("This is a floorplan visualization. Mode: 3DFloorplan. Analyze the layout and suggest a 3D conversion.")
        );
        assert!(WorkflowKind::Utility(UtilityKind::VirtualTour)
            .analysis_context()
            .unwrap_or_default()
            .contains("Specialized architectural utility: Virtual Tour."));
        assert_eq!(WorkflowKind::Video.analysis_context(), None);
    }
}
