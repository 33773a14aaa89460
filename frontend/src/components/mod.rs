pub mod dashboard;
pub mod detail_modal;
pub mod filter_bar;
pub mod metric_card;
pub mod summary_table;

pub use dashboard::*;
pub use detail_modal::*;
pub use filter_bar::*;
pub use metric_card::*;
pub use summary_table::*;
