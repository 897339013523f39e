/// 头像/封面生成
pub mod image;

/// 存活探针
pub mod ping;
