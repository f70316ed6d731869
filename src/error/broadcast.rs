use thiserror::Error;

/// Ошибка, возвращённая слушателем из его колбэка.
///
/// Библиотека не навязывает конкретный тип: слушатель волен вернуть
/// любую ошибку, она донесётся до вызывающего `broadcast` как есть.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Результат одного вызова слушателя.
pub type ListenerResult = Result<(), ListenerError>;

/// Ошибка вещания в канал.
#[derive(Debug, Error)]
pub enum BroadcastError {
    /// Слушатель вернул ошибку; оставшиеся слушатели этого вещания
    /// не вызывались.
    #[error("listener {index} on channel \"{channel}\" failed")]
    Listener {
        channel: String,
        index: usize,
        #[source]
        source: ListenerError,
    },
}

impl BroadcastError {
    /// Имя канала, на котором прервалось вещание.
    pub fn channel(&self) -> &str {
        match self {
            BroadcastError::Listener { channel, .. } => channel,
        }
    }

    /// Позиция отказавшего слушателя в порядке регистрации.
    pub fn index(&self) -> usize {
        match self {
            BroadcastError::Listener { index, .. } => *index,
        }
    }
}
