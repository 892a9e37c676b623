//! The rewrite passes, in the order the standard pipeline runs them.

pub mod blank_lines;
pub mod layout;
pub mod regions;
pub mod rename;
pub mod reorder;
pub mod usings;

pub use blank_lines::CollapseBlankLines;
pub use layout::ListLayout;
pub use regions::RemoveRegions;
pub use rename::Rename;
pub use reorder::ReorderMembers;
pub use usings::SortUsings;

use crate::pipeline::Pass;

/// Every name a pass can be disabled by.
pub const PASS_NAMES: &[&str] = &[
    RemoveRegions::NAME,
    CollapseBlankLines::NAME,
    SortUsings::NAME,
    Rename::NAME,
    ReorderMembers::NAME,
    ListLayout::NAME,
];

/// Micro-passes, then semantic passes, then layout.
pub fn standard_passes() -> Vec<Pass> {
    vec![
        Pass::Syntax(Box::new(RemoveRegions)),
        Pass::Syntax(Box::new(CollapseBlankLines)),
        Pass::Syntax(Box::new(SortUsings)),
        Pass::Semantic(Box::new(Rename)),
        Pass::Semantic(Box::new(ReorderMembers)),
        Pass::Syntax(Box::new(ListLayout)),
        Pass::Syntax(Box::new(CollapseBlankLines)),
    ]
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::config::RewriteConfig;
    use crate::model::SyntacticModel;
    use crate::pipeline::{Pass, Pipeline, UnitReport};

    /// Run a single pass to its fixed point over one parsed unit.
    pub(crate) fn run_pass(pass: Pass, source: &str, config: RewriteConfig) -> UnitReport {
        let mut model = SyntacticModel::new();
        let unit = model.add_source("Sample.cs", source).unwrap();
        Pipeline::new(config)
            .with_pass(pass)
            .run_unit(unit, &mut model)
            .unwrap()
    }
}
