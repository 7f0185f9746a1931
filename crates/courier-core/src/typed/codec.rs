//! PayloadCodec - 引数 1 個を (bytes, content-type) に変換
//!
//! # エンコードフロー
//! 1. 引数を serde でシリアライズ
//! 2. content-type とセットで Task の payload に入れる
//! 3. 失敗時は CodecError（呼び出しは失敗し、キューには入らない）
//!
//! デコードは下流の実行側の責務なので、ここには持たない。

use serde::{Deserialize, Serialize};

/// Encoded argument: body bytes plus the content type to send with them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

/// CodecError は引数のエンコード失敗
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("json encode: {0}")]
    Json(#[from] serde_json::Error),
}

/// Wire format of the task body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadCodec {
    #[default]
    Json,
}

impl PayloadCodec {
    pub fn content_type(&self) -> &'static str {
        match self {
            PayloadCodec::Json => "application/json; charset=utf-8",
        }
    }

    pub fn encode<A: Serialize + ?Sized>(&self, argument: &A) -> Result<EncodedPayload, CodecError> {
        let bytes = match self {
            PayloadCodec::Json => serde_json::to_vec(argument)?,
        };
        Ok(EncodedPayload {
            bytes,
            content_type: self.content_type(),
        })
    }
}
