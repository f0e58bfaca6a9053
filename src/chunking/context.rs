use super::heading::{HeadingLevel, HeadingPath, LineClass, NumberedHeading};

pub const GENERAL_SECTION: &str = "General";
pub const CONTENTS_SECTION: &str = "Contents";

const GENERIC_SECTIONS: [&str; 4] = [
    GENERAL_SECTION,
    "Preface",
    "Introduction",
    "Statement of the Standard",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TrackerMode {
    #[default]
    Normal,
    SkippingToc,
}

/// Structural position reached after consuming a prefix of the block stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionContext {
    pub main_section: String,
    pub heading_path: HeadingPath,
    pub mode: TrackerMode,
    /// Set when a main section has opened and nothing has been buffered under it yet.
    pub awaiting_first_content: bool,
}

impl Default for SectionContext {
    fn default() -> Self {
        Self {
            main_section: GENERAL_SECTION.to_string(),
            heading_path: Vec::new(),
            mode: TrackerMode::Normal,
            awaiting_first_content: false,
        }
    }
}

/// What happens to the block that triggered a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineDisposition {
    Append,
    /// Keep only the text after the marker's first line.
    AppendRemainder,
    Drop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Close the buffered chunk under the previous context before applying `next`.
    pub close_chunk: bool,
    pub next: SectionContext,
    pub line: LineDisposition,
}

impl SectionContext {
    pub fn is_skipping_toc(&self) -> bool {
        self.mode == TrackerMode::SkippingToc
    }

    fn opened(main_section: &str, heading_path: HeadingPath) -> Self {
        Self {
            main_section: main_section.to_string(),
            heading_path,
            mode: TrackerMode::Normal,
            awaiting_first_content: true,
        }
    }

    fn with_heading_path(&self, heading_path: HeadingPath) -> Self {
        Self {
            main_section: self.main_section.clone(),
            heading_path,
            mode: TrackerMode::Normal,
            awaiting_first_content: false,
        }
    }

    pub fn advance(&self, class: &LineClass) -> Transition {
        match self.mode {
            TrackerMode::SkippingToc => self.advance_in_toc(class),
            TrackerMode::Normal => self.advance_normal(class),
        }
    }

    fn advance_in_toc(&self, class: &LineClass) -> Transition {
        match class {
            LineClass::MainSection(name) if name != CONTENTS_SECTION => Transition {
                close_chunk: false,
                next: Self::opened(name, Vec::new()),
                line: LineDisposition::AppendRemainder,
            },
            _ => Transition {
                close_chunk: false,
                next: self.clone(),
                line: LineDisposition::Drop,
            },
        }
    }

    fn advance_normal(&self, class: &LineClass) -> Transition {
        match class {
            LineClass::MainSection(name) if name == CONTENTS_SECTION => Transition {
                close_chunk: true,
                next: Self {
                    main_section: CONTENTS_SECTION.to_string(),
                    heading_path: Vec::new(),
                    mode: TrackerMode::SkippingToc,
                    awaiting_first_content: false,
                },
                line: LineDisposition::Drop,
            },
            LineClass::MainSection(name) => Transition {
                close_chunk: true,
                next: Self::opened(name, Vec::new()),
                line: LineDisposition::AppendRemainder,
            },
            LineClass::Numbered(heading) => self.advance_heading(heading),
            LineClass::Plain => Transition {
                close_chunk: false,
                next: self.with_heading_path(self.heading_path.clone()),
                line: LineDisposition::Append,
            },
        }
    }

    fn advance_heading(&self, heading: &NumberedHeading) -> Transition {
        let entry = (heading.level, heading.title.clone());

        if heading.level.is_top_rank() && should_promote(&self.main_section, &heading.title) {
            return Transition {
                close_chunk: true,
                next: Self::opened(&heading.title, vec![entry]),
                line: LineDisposition::Append,
            };
        }

        let heading_path = match heading.level {
            HeadingLevel::L1Numbered | HeadingLevel::InNumbered => vec![entry],
            HeadingLevel::L2Slash | HeadingLevel::L3DoubleSlash => {
                let mut path = self
                    .heading_path
                    .iter()
                    .filter(|(level, _)| level.rank() < heading.level.rank())
                    .cloned()
                    .collect::<HeadingPath>();
                path.push(entry);
                path
            }
        };

        Transition {
            close_chunk: !self.awaiting_first_content,
            next: self.with_heading_path(heading_path),
            line: LineDisposition::Append,
        }
    }
}

pub fn is_generic_section(name: &str) -> bool {
    GENERIC_SECTIONS.contains(&name)
}

pub fn is_appendix_section(name: &str) -> bool {
    name.trim_start()
        .get(..8)
        .map(|prefix| prefix.eq_ignore_ascii_case("appendix"))
        .unwrap_or(false)
}

/// A top-rank heading opens a new main section unless it just repeats a
/// specific (non-generic, non-appendix) section title.
fn should_promote(active_section: &str, title: &str) -> bool {
    if is_generic_section(active_section) || is_appendix_section(active_section) {
        return true;
    }

    title != active_section
}
