//! Infrastructure layer
//!
//! ドメイン層が定義する trait の具体的な実装と、ワイヤ形式の DTO を提供します。

pub mod connection_registry;
pub mod dto;
pub mod google;
pub mod notification;
pub mod profile;
pub mod repository;
