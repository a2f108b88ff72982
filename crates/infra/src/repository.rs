//! # リポジトリ
//!
//! 通知設定の永続化を担当する。
//!
//! - [`SettingsRepository`]: 設定の読み書きトレイト
//! - [`JsonFileSettingsRepository`]: JSON ファイル実装
//! - [`InMemorySettingsRepository`]: プロセス内メモリ実装

pub mod settings_repository;

pub use settings_repository::{
    InMemorySettingsRepository,
    JsonFileSettingsRepository,
    SettingsRepository,
};
