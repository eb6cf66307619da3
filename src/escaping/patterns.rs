/*!
 * Ordered rewrite rules for over-escaped markup.
 *
 * Conversion tools often render an active command such as `\section{Title}`
 * as literal text: `\textbackslash{}section\{Title\}`. Each rule below matches
 * one such shape and restores the active form.
 *
 * Rules run in declaration order within a pass. Every rule removes at least
 * one `\textbackslash{}` marker, so each replacement strictly shortens the
 * text and the engine's pass loop always terminates.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Rule categories, in the order they appear in the standard table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PatternCategory {
    BasicCommand,
    SectionHeading,
    Environment,
    TextFormatting,
    CrossReference,
    SpecialCharacter,
    TableFigure,
    FontColor,
    PackageSpecific,
    CompoundNested,
}

impl PatternCategory {
    /// All categories in table order
    pub const ALL: [PatternCategory; 10] = [
        PatternCategory::BasicCommand,
        PatternCategory::SectionHeading,
        PatternCategory::Environment,
        PatternCategory::TextFormatting,
        PatternCategory::CrossReference,
        PatternCategory::SpecialCharacter,
        PatternCategory::TableFigure,
        PatternCategory::FontColor,
        PatternCategory::PackageSpecific,
        PatternCategory::CompoundNested,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PatternCategory::BasicCommand => "basic command escaping",
            PatternCategory::SectionHeading => "section/heading escaping",
            PatternCategory::Environment => "environment delimiters",
            PatternCategory::TextFormatting => "text formatting commands",
            PatternCategory::CrossReference => "cross-reference commands",
            PatternCategory::SpecialCharacter => "special characters",
            PatternCategory::TableFigure => "table/figure commands",
            PatternCategory::FontColor => "font/color commands",
            PatternCategory::PackageSpecific => "package-specific commands",
            PatternCategory::CompoundNested => "compound/nested escaping",
        }
    }
}

impl std::fmt::Display for PatternCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Declarative form of a rule, before compilation
#[derive(Debug, Clone, Copy)]
pub struct PatternSpec {
    pub category: PatternCategory,
    /// Regex over the raw text
    pub pattern: &'static str,
    /// Replacement template (`${n}` refers to capture groups)
    pub replacement: &'static str,
    pub description: &'static str,
}

/// The standard rule table
pub static PATTERN_SPECS: &[PatternSpec] = &[
    // Basic command wrapping
    PatternSpec {
        category: PatternCategory::BasicCommand,
        pattern: r"\\textbackslash\{\}([a-zA-Z]+)\\textbackslash\{\}\{",
        replacement: r"\${1}{",
        description: "escaped command with escaped opening brace",
    },
    PatternSpec {
        category: PatternCategory::BasicCommand,
        pattern: r"\\textbackslash\{\}([a-zA-Z]+)\{\}",
        replacement: r"\${1}{}",
        description: "escaped command with empty group",
    },
    // Section and heading wrapping
    PatternSpec {
        category: PatternCategory::SectionHeading,
        pattern: r"\\textbackslash\{\}(part|chapter|section|subsection|subsubsection|paragraph|subparagraph)(\*?)\\\{([^{}\\]*)\\\}",
        replacement: r"\${1}${2}{${3}}",
        description: "escaped heading with escaped braces",
    },
    PatternSpec {
        category: PatternCategory::SectionHeading,
        pattern: r"\\textbackslash\{\}(part|chapter|section|subsection|subsubsection|paragraph|subparagraph)(\*?)\[([^\]]*)\]\\\{([^{}\\]*)\\\}",
        replacement: r"\${1}${2}[${3}]{${4}}",
        description: "escaped heading with short title",
    },
    PatternSpec {
        category: PatternCategory::SectionHeading,
        pattern: r"\\textbackslash\{\}(part|chapter|section|subsection|subsubsection|paragraph|subparagraph)\*\\textbackslash\{\}\{",
        replacement: r"\${1}*{",
        description: "escaped starred heading with escaped opening brace",
    },
    // Environment delimiters
    PatternSpec {
        category: PatternCategory::Environment,
        pattern: r"\\textbackslash\{\}begin\\\{(tabular\*?|tabularx|longtable|array)\\\}\\\{([^{}\\]*)\\\}",
        replacement: r"\begin{${1}}{${2}}",
        description: "escaped tabular environment with column spec",
    },
    PatternSpec {
        category: PatternCategory::Environment,
        pattern: r"\\textbackslash\{\}(begin|end)\\\{([a-zA-Z*]+)\\\}",
        replacement: r"\${1}{${2}}",
        description: "escaped environment delimiter",
    },
    PatternSpec {
        category: PatternCategory::Environment,
        pattern: r"\\textbackslash\{\}item\b",
        replacement: r"\item",
        description: "escaped list item",
    },
    // Text formatting
    PatternSpec {
        category: PatternCategory::TextFormatting,
        pattern: r"\\textbackslash\{\}(textbf|textit|emph|underline|texttt|textsc|textsf|textrm|textsl|textup|textmd|textnormal|uline|mbox)\\\{([^{}\\]*)\\\}",
        replacement: r"\${1}{${2}}",
        description: "escaped text formatting command",
    },
    // Cross-references
    PatternSpec {
        category: PatternCategory::CrossReference,
        pattern: r"\\textbackslash\{\}href\\\{([^{}\\]*)\\\}\\\{([^{}\\]*)\\\}",
        replacement: r"\href{${1}}{${2}}",
        description: "escaped hyperlink",
    },
    PatternSpec {
        category: PatternCategory::CrossReference,
        pattern: r"\\textbackslash\{\}(ref|eqref|pageref|autoref|cref|Cref|nameref|label|cite|citep|citet|footnote|url)\\\{([^{}\\]*)\\\}",
        replacement: r"\${1}{${2}}",
        description: "escaped reference command",
    },
    // Special single characters
    PatternSpec {
        category: PatternCategory::SpecialCharacter,
        pattern: r"\\textbackslash\{\}\\textbackslash\{\}",
        replacement: r"\\",
        description: "escaped line break",
    },
    PatternSpec {
        category: PatternCategory::SpecialCharacter,
        pattern: r"\\textbackslash\{\}\\([%&$#_{}~^])",
        replacement: r"\${1}",
        description: "double-escaped special character",
    },
    // Tables and figures
    PatternSpec {
        category: PatternCategory::TableFigure,
        pattern: r"\\textbackslash\{\}(hline|toprule|midrule|bottomrule|centering|raggedright|raggedleft|newline|linebreak|noindent|clearpage|newpage|pagebreak)\b",
        replacement: r"\${1}",
        description: "escaped table rule or layout command",
    },
    PatternSpec {
        category: PatternCategory::TableFigure,
        pattern: r"\\textbackslash\{\}includegraphics(\[[^\]]*\])?\\\{([^{}\\]*)\\\}",
        replacement: r"\includegraphics${1}{${2}}",
        description: "escaped graphics inclusion",
    },
    PatternSpec {
        category: PatternCategory::TableFigure,
        pattern: r"\\textbackslash\{\}(caption|cline)\\\{([^{}\\]*)\\\}",
        replacement: r"\${1}{${2}}",
        description: "escaped caption or partial rule",
    },
    PatternSpec {
        category: PatternCategory::TableFigure,
        pattern: r"\\textbackslash\{\}multicolumn\\\{([^{}\\]*)\\\}\\\{([^{}\\]*)\\\}\\\{([^{}\\]*)\\\}",
        replacement: r"\multicolumn{${1}}{${2}}{${3}}",
        description: "escaped multicolumn cell",
    },
    // Fonts and colors
    PatternSpec {
        category: PatternCategory::FontColor,
        pattern: r"\\textbackslash\{\}(textcolor|colorbox)\\\{([^{}\\]*)\\\}\\\{([^{}\\]*)\\\}",
        replacement: r"\${1}{${2}}{${3}}",
        description: "escaped two-argument color command",
    },
    PatternSpec {
        category: PatternCategory::FontColor,
        pattern: r"\\textbackslash\{\}(color|pagecolor)\\\{([^{}\\]*)\\\}",
        replacement: r"\${1}{${2}}",
        description: "escaped color switch",
    },
    PatternSpec {
        category: PatternCategory::FontColor,
        pattern: r"\\textbackslash\{\}(tiny|scriptsize|footnotesize|small|normalsize|large|Large|LARGE|huge|Huge|bfseries|itshape|ttfamily|sffamily|rmfamily|scshape|mdseries|upshape|normalfont)\b",
        replacement: r"\${1}",
        description: "escaped font size or shape switch",
    },
    // Package-specific commands
    PatternSpec {
        category: PatternCategory::PackageSpecific,
        pattern: r"\\textbackslash\{\}(usepackage|documentclass)(\[[^\]]*\])?\\\{([^{}\\]*)\\\}",
        replacement: r"\${1}${2}{${3}}",
        description: "escaped package or class declaration",
    },
    PatternSpec {
        category: PatternCategory::PackageSpecific,
        pattern: r"\\textbackslash\{\}(input|include|subfile|includeonly|bibliography|bibliographystyle)\\\{([^{}\\]*)\\\}",
        replacement: r"\${1}{${2}}",
        description: "escaped file inclusion",
    },
    PatternSpec {
        category: PatternCategory::PackageSpecific,
        pattern: r"\\textbackslash\{\}(tcbset|hypersetup|geometry)\\\{([^{}\\]*)\\\}",
        replacement: r"\${1}{${2}}",
        description: "escaped package setup command",
    },
    PatternSpec {
        category: PatternCategory::PackageSpecific,
        pattern: r"\\textbackslash\{\}(maketitle|tableofcontents|listoffigures|listoftables|appendix|printbibliography|frontmatter|mainmatter|backmatter)\b",
        replacement: r"\${1}",
        description: "escaped document structure command",
    },
    // Compound and nested combinations
    PatternSpec {
        category: PatternCategory::CompoundNested,
        pattern: r"\\textbackslash\{\}([a-zA-Z]+)\\\{([^{}\\]*)\\\}",
        replacement: r"\${1}{${2}}",
        description: "escaped command not covered above",
    },
    PatternSpec {
        category: PatternCategory::CompoundNested,
        pattern: r"\\textbackslash\{\}([a-zA-Z]+)\\\{((?:[^{}\\]|\\[a-zA-Z]+\*?|\{(?:[^{}]|\{[^{}]*\})*\})*)\\\}",
        replacement: r"\${1}{${2}}",
        description: "escaped command wrapping already-active commands",
    },
    PatternSpec {
        category: PatternCategory::CompoundNested,
        pattern: r"\\textbackslash\{\}(\\[a-zA-Z@]+)",
        replacement: r"${1}",
        description: "escape marker in front of an active command",
    },
];

/// A compiled rule
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub category: PatternCategory,
    pub regex: Regex,
    pub replacement: &'static str,
    pub description: &'static str,
}

/// An ordered, compiled rule table
#[derive(Debug, Clone)]
pub struct PatternTable {
    rules: Vec<PatternRule>,
}

/// The standard table, compiled once
static STANDARD_TABLE: Lazy<PatternTable> = Lazy::new(|| {
    PatternTable::from_specs(PATTERN_SPECS).expect("Invalid escaping pattern table")
});

impl PatternTable {
    /// The built-in rule table
    pub fn standard() -> &'static PatternTable {
        &STANDARD_TABLE
    }

    /// Compile `specs` in order
    pub fn from_specs(specs: &[PatternSpec]) -> Result<Self, regex::Error> {
        let rules = specs
            .iter()
            .map(|spec| {
                Ok(PatternRule {
                    category: spec.category,
                    regex: Regex::new(spec.pattern)?,
                    replacement: spec.replacement,
                    description: spec.description,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules belonging to `category`, in table order
    pub fn by_category(&self, category: PatternCategory) -> impl Iterator<Item = &PatternRule> {
        self.rules.iter().filter(move |rule| rule.category == category)
    }
}
