//! Tag co-occurrence clustering engine.
//!
//! コーパスのスナップショットとクエリパラメータから、ツリーマップ表示用の
//! セクター一覧を計算する。全ての中間構造はクエリ単位で生成・破棄する。

pub mod assign;
pub mod association;
pub mod candidates;
pub mod components;
pub mod corpus;
pub mod custom;
pub mod engine;
pub mod error;
pub mod neighbors;
pub mod overlap;
pub mod params;
pub mod report;
pub mod service;
pub mod single;
pub mod tuning;

pub use corpus::CorpusSnapshot;
pub use engine::{PlanStats, PlannedSector, SectorPlan, plan_custom_sector, plan_sectors};
pub use error::TagMapError;
pub use params::{Namespace, RawTagMapQuery, StatusFilter, TagMapParams, ViewMode};
pub use report::{ContributorCount, Sector, TagMapResponse};
pub use service::TagMapService;
pub use tuning::{Tuning, TuningOverrides};
