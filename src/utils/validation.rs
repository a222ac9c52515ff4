//! Utilidades de validación
//!
//! Validadores personalizados para los DTOs de entrada.

use validator::ValidationError;

/// Validar que un string no esté vacío (ignorando espacios)
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_blank");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar referencias de etiqueta/foto
pub fn validate_photo_references(values: &[String]) -> Result<(), ValidationError> {
    if let Some(blank) = values.iter().position(|value| value.trim().is_empty()) {
        let mut error = ValidationError::new("photo_reference");
        error.add_param("index".into(), &blank);
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("Habitación 12").is_ok());
        assert!(validate_not_blank("   ").is_err());
    }

    #[test]
    fn test_validate_photo_references() {
        assert!(validate_photo_references(&["etiqueta.jpg".to_string()]).is_ok());
        assert!(validate_photo_references(&["a.jpg".to_string(), "".to_string()]).is_err());
    }
}
