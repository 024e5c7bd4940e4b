// Library exports for datalens

pub mod classify;
pub mod config;
pub mod csv_reader;
pub mod data;
pub mod error;
pub mod insight;
pub mod ir;
pub mod options;
pub mod palette;
pub mod preview;
pub mod registry;
pub mod resolve;
pub mod stat;
pub mod transform;

pub use classify::{classify, SemanticType};
pub use data::{Cell, Column, Dataset, DatasetInfo, StorageType};
pub use error::{BuildCause, ChartBuildError, ServiceError, ValidationError};
pub use insight::{recommend, CompletionService, OpenAiClient};
pub use ir::{ChartConfig, ChartPayload, RenderKind};
pub use options::{options, ChartOptions};
pub use preview::{preview, statistics, PreviewMode, StatisticsTable, Table};
pub use registry::{requirements, ChartType, ChartTypeSpec};
pub use resolve::{resolve, CompatibleColumns};
pub use transform::{build, chart_config, ChartRequest};
