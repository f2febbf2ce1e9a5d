// JumpFlix 内容目录后端库
//
// 本库提供：
// - HTTP API 路由
// - 行存储（SQLite / Supabase PostgREST）
// - 媒体对象存储与上传
// - 内容创作工作流
// - 认证会话

pub mod api;
pub mod config;
pub mod database;
pub mod external;
pub mod models;
pub mod services;
pub mod storage;
