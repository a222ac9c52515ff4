//! Clasificador de prioridad por observaciones
//!
//! Deriva la prioridad de un servicio a partir del texto libre de sus
//! observaciones. La tabla de palabras clave es fija: el mismo texto produce
//! siempre la misma prioridad, de modo que regenerar rutas no cambia su contenido.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::ServicePriority;

/// Palabras que marcan un servicio urgente
pub const HIGH_PRIORITY_KEYWORDS: &[&str] = &[
    "urgente",
    "urgent",
    "urgencia",
    "express",
    "vip",
    "inmediato",
    "inmediata",
    "asap",
    "hoy mismo",
    "checkout",
    "check-out",
];

/// Palabras que marcan un servicio preferente
pub const MEDIUM_PRIORITY_KEYWORDS: &[&str] = &[
    "prioridad",
    "prioritario",
    "preferente",
    "pronto",
    "rápido",
    "rapido",
    "importante",
    "delicado",
    "delicada",
];

lazy_static! {
    static ref HIGH_PRIORITY_RE: Regex = keyword_regex(HIGH_PRIORITY_KEYWORDS);
    static ref MEDIUM_PRIORITY_RE: Regex = keyword_regex(MEDIUM_PRIORITY_KEYWORDS);
}

fn keyword_regex(keywords: &[&str]) -> Regex {
    let alternation = keywords
        .iter()
        .map(|keyword| regex::escape(keyword))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).expect("keyword table must compile")
}

/// Estrategia de derivación de prioridad
pub trait PriorityClassifier: Send + Sync {
    fn classify(&self, observations: Option<&str>) -> ServicePriority;
}

/// Clasificador por tabla de palabras clave (HIGH gana sobre MEDIUM)
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl PriorityClassifier for KeywordClassifier {
    fn classify(&self, observations: Option<&str>) -> ServicePriority {
        classify_observations(observations)
    }
}

pub fn classify_observations(observations: Option<&str>) -> ServicePriority {
    let text = match observations.map(str::trim) {
        Some(text) if !text.is_empty() => text,
        _ => return ServicePriority::Normal,
    };

    if HIGH_PRIORITY_RE.is_match(text) {
        ServicePriority::High
    } else if MEDIUM_PRIORITY_RE.is_match(text) {
        ServicePriority::Medium
    } else {
        ServicePriority::Normal
    }
}
