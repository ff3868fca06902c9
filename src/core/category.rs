//! Measurement categories recognised by filename tag.

use std::fmt;

/// Voltammetry technique a raw export belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// Linear sweep voltammetry
    Lsv,
    /// Cyclic voltammetry
    Cv,
}

impl Category {
    /// All categories in processing order.
    pub const ALL: [Category; 2] = [Category::Lsv, Category::Cv];

    /// Case-sensitive filename tag.
    pub fn tag(&self) -> &'static str {
        match self {
            Category::Lsv => "lsv",
            Category::Cv => "cv",
        }
    }

    /// Upper-case label used in titles and master file names.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Lsv => "LSV",
            Category::Cv => "CV",
        }
    }

    /// File name of the category master table at the batch root.
    pub fn master_file_name(&self) -> String {
        format!("master_{}.csv", self.label())
    }

    /// File stem of the per-folder plot images.
    pub fn plot_stem(&self) -> String {
        format!("{}_plot", self.tag())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
