//! InputService — единственный InputReader на App
//!
//! Вместо глобального singleton'а: service создаёт composition root
//! и явно передаёт потребителям. Живёт дольше любых game objects,
//! поэтому переживает их re-spawn.

use super::InputReader;
use crate::error::InputError;
use crate::logger;

#[derive(Debug, Default)]
pub struct InputService {
    reader: Option<InputReader>,
}

impl InputService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Устанавливает reader, если слот пуст
    ///
    /// Второй reader отклоняется и дропается: выживает первый.
    pub fn install(&mut self, reader: InputReader) -> Result<(), InputError> {
        if self.reader.is_some() {
            logger::log_warning("InputService: reader already installed, dropping duplicate");
            return Err(InputError::DuplicateReader);
        }

        self.reader = Some(reader);
        Ok(())
    }

    pub fn reader(&self) -> Option<&InputReader> {
        self.reader.as_ref()
    }

    pub fn reader_mut(&mut self) -> Option<&mut InputReader> {
        self.reader.as_mut()
    }

    pub fn is_installed(&self) -> bool {
        self.reader.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use bevy::prelude::KeyCode;

    #[test]
    fn test_second_reader_rejected_first_survives() {
        let bus = EventBus::new();
        let mut service = InputService::new();

        assert!(service.install(InputReader::new(bus.clone(), KeyCode::Space)).is_ok());
        let result = service.install(InputReader::new(bus, KeyCode::KeyJ));

        assert_eq!(result, Err(InputError::DuplicateReader));
        let reader = service.reader().expect("first reader must survive");
        assert_eq!(reader.jump_key(), KeyCode::Space);
    }

    #[test]
    fn test_empty_service_has_no_reader() {
        let service = InputService::new();

        assert!(!service.is_installed());
        assert!(service.reader().is_none());
    }
}
