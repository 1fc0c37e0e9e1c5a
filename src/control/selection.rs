//! Closed enumerations the controls select from.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hint to the inference runtime about which hardware may execute a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ComputeUnits {
    /// Any available unit, accelerators included.
    #[default]
    Automatic,
    /// General-purpose cores plus the graphics accelerator.
    CpuAndAccelerator,
    /// General-purpose cores only.
    CpuOnly,
}

impl ComputeUnits {
    /// Every preference, in selector order.
    pub const ALL: [ComputeUnits; 3] = [
        ComputeUnits::Automatic,
        ComputeUnits::CpuAndAccelerator,
        ComputeUnits::CpuOnly,
    ];

    /// Selector label.
    pub fn label(self) -> &'static str {
        match self {
            ComputeUnits::Automatic => "All",
            ComputeUnits::CpuAndAccelerator => "CPU+GPU",
            ComputeUnits::CpuOnly => "CPU",
        }
    }
}

/// How a frame is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProcessingMode {
    /// Display the raw frame.
    #[default]
    PassThrough,
    /// Run the selected style model with the given preference.
    Infer(ComputeUnits),
}

impl ProcessingMode {
    /// Every mode, in index order.
    pub const ALL: [ProcessingMode; 4] = [
        ProcessingMode::PassThrough,
        ProcessingMode::Infer(ComputeUnits::Automatic),
        ProcessingMode::Infer(ComputeUnits::CpuAndAccelerator),
        ProcessingMode::Infer(ComputeUnits::CpuOnly),
    ];

    /// Maps a full-range selector index to a mode. Indices past the
    /// enumeration have no mode.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Position of this mode in [`ProcessingMode::ALL`].
    pub fn index(self) -> usize {
        match self {
            ProcessingMode::PassThrough => 0,
            ProcessingMode::Infer(ComputeUnits::Automatic) => 1,
            ProcessingMode::Infer(ComputeUnits::CpuAndAccelerator) => 2,
            ProcessingMode::Infer(ComputeUnits::CpuOnly) => 3,
        }
    }

    /// The preference, if this mode runs a model.
    pub fn compute_units(self) -> Option<ComputeUnits> {
        match self {
            ProcessingMode::PassThrough => None,
            ProcessingMode::Infer(units) => Some(units),
        }
    }

    /// True for [`ProcessingMode::PassThrough`].
    pub fn is_pass_through(self) -> bool {
        self == ProcessingMode::PassThrough
    }
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessingMode::PassThrough => f.write_str("pass-through"),
            ProcessingMode::Infer(units) => write!(f, "infer({})", units.label()),
        }
    }
}

/// One of the seven bundled styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StyleId {
    /// Artifact `style1`.
    #[default]
    Style1,
    /// Artifact `style2`.
    Style2,
    /// Artifact `style3`.
    Style3,
    /// Artifact `style4`.
    Style4,
    /// Artifact `style5`.
    Style5,
    /// Artifact `style6`.
    Style6,
    /// Artifact `style7`.
    Style7,
}

impl StyleId {
    /// Every style, in selector order.
    pub const ALL: [StyleId; 7] = [
        StyleId::Style1,
        StyleId::Style2,
        StyleId::Style3,
        StyleId::Style4,
        StyleId::Style5,
        StyleId::Style6,
        StyleId::Style7,
    ];

    /// Maps a style selector index. Indices past the seventh style have no style.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Position of this style in [`StyleId::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Artifact base name, also the selector label.
    pub fn name(self) -> &'static str {
        match self {
            StyleId::Style1 => "style1",
            StyleId::Style2 => "style2",
            StyleId::Style3 => "style3",
            StyleId::Style4 => "style4",
            StyleId::Style5 => "style5",
            StyleId::Style6 => "style6",
            StyleId::Style7 => "style7",
        }
    }
}

impl fmt::Display for StyleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Layout of the mode selector control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ModeSelector {
    /// Two segments: Off and On.
    #[default]
    OnOff,
    /// One segment per [`ProcessingMode`].
    Full,
}

/// A single segment of the mode selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeOption {
    /// Text shown on the segment.
    pub label: &'static str,
    pub mode: ProcessingMode,
}

impl ModeSelector {
    /// Builds the segment list. `on_units` is the preference behind the
    /// "On" segment of the two-way layout.
    pub fn options(self, on_units: ComputeUnits) -> Vec<ModeOption> {
        match self {
            ModeSelector::OnOff => vec![
                ModeOption {
                    label: "Off",
                    mode: ProcessingMode::PassThrough,
                },
                ModeOption {
                    label: "On",
                    mode: ProcessingMode::Infer(on_units),
                },
            ],
            ModeSelector::Full => ProcessingMode::ALL
                .iter()
                .map(|&mode| ModeOption {
                    label: match mode {
                        ProcessingMode::PassThrough => "Off",
                        ProcessingMode::Infer(units) => units.label(),
                    },
                    mode,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_mode_index_mapping_is_total() {
        for (i, mode) in ProcessingMode::ALL.iter().enumerate() {
            assert_eq!(ProcessingMode::from_index(i), Some(*mode));
            assert_eq!(mode.index(), i);
        }
        assert_eq!(ProcessingMode::from_index(4), None);
    }

    #[test]
    fn test_style_names() {
        assert_eq!(StyleId::Style1.name(), "style1");
        assert_eq!(StyleId::Style7.to_string(), "style7");
        assert_eq!(StyleId::from_index(2), Some(StyleId::Style3));
        assert_eq!(StyleId::from_index(7), None);
    }

    #[test]
    fn test_on_off_layout() {
        let options = ModeSelector::OnOff.options(ComputeUnits::Automatic);
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].mode, ProcessingMode::PassThrough);
        assert_eq!(options[1].mode, ProcessingMode::Infer(ComputeUnits::Automatic));
        assert_eq!(options[1].label, "On");
    }

    #[test]
    fn test_full_layout_covers_every_mode() {
        let modes: Vec<_> = ModeSelector::Full
            .options(ComputeUnits::CpuOnly)
            .into_iter()
            .map(|o| o.mode)
            .collect();
        assert_eq!(modes, ProcessingMode::ALL.to_vec());
    }

    #[test]
    fn test_compute_units_serde_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            units: ComputeUnits,
        }
        let w: Wrapper = toml::from_str("units = \"cpu-and-accelerator\"").unwrap();
        assert_eq!(w.units, ComputeUnits::CpuAndAccelerator);
    }

    proptest! {
        #[test]
        fn style_index_round_trips(index in 0usize..16) {
            match StyleId::from_index(index) {
                Some(style) => prop_assert_eq!(style.index(), index),
                None => prop_assert!(index >= StyleId::ALL.len()),
            }
        }
    }
}
