use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Одно значение аргумента вещания.
///
/// Кортеж аргументов `broadcast` гетерогенный, поэтому значения
/// представлены тегированным перечислением с конверсиями из
/// привычных типов Rust.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Bytes),
    Json(serde_json::Value),
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Bytes> for Value {
    fn from(v: Bytes) -> Self {
        Value::Bytes(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

/// Сообщение одного вещания.
///
/// Все слушатели канала получают ссылку на одно и то же сообщение:
/// полный кортеж аргументов никогда не режется и не меняется по ходу
/// доставки.
#[derive(Debug, Clone)]
pub struct Message {
    /// Имя канала, в который шло вещание.
    pub channel: Arc<str>,
    /// Полный кортеж аргументов вещания.
    pub args: Arc<[Value]>,
}

impl Message {
    pub fn new(
        channel: impl Into<Arc<str>>,
        args: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Self {
        Self {
            channel: channel.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Аргумент по позиции в кортеже.
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    /// Имя канала сообщения.
    pub fn channel_name(&self) -> &str {
        &self.channel
    }
}
