//! Persona and prompt text sent to the text generator.
//!
//! The mentor speaks Italian to the child, in the voice of the theme's
//! character, and keeps it to one or two sentences.

use hero_core::{MentorEvent, ThemeConfig};
use serde::Serialize;

/// Sampling temperature used unless the config overrides it.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// One request to the text-generation collaborator.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MentorRequest {
    /// Persona instructions.
    pub system: String,
    /// What to say right now.
    pub prompt: String,
    pub temperature: f32,
}

/// Persona instructions for `theme`'s mentor talking to `user_name`.
pub fn system_persona(user_name: &str, theme: &ThemeConfig) -> String {
    format!(
        "Stai impersonando \"{mentor}\", un mentore per un'app educativa di matematica per bambini.\n\
         Il tema dell'app è: {world}.\n\
         Il tuo tono deve essere coerente con il personaggio.\n\
         Parla in italiano. Usa emoji attinenti ({emoji}). Sii breve (max 1-2 frasi).\n\
         Il bambino si chiama {user_name}.",
        mentor = theme.mentor_name,
        world = theme.name,
        emoji = theme.mentor_emoji,
    )
}

/// Context prompt for a session event.
pub fn event_prompt(event: &MentorEvent, user_name: &str, theme: &ThemeConfig) -> String {
    match event {
        MentorEvent::Welcome => format!(
            "Saluta {user_name} nel tuo stile unico e invitalo a imparare le tabelline."
        ),
        MentorEvent::Correct { question } => format!(
            "Il bambino ha risposto correttamente a {question}. Dagli un complimento in stile {}!",
            theme.mentor_name
        ),
        MentorEvent::Mistake {
            question,
            answer,
            correct_answer,
        } => format!(
            "Il bambino ha sbagliato {question}. Ha risposto {answer}, ma era {correct_answer}. \
             Incoraggialo gentilmente in stile {} a riprovare.",
            theme.mentor_name
        ),
        MentorEvent::LevelComplete => {
            "Il bambino ha finito una sessione! Congratulati per il traguardo raggiunto.".to_string()
        }
    }
}

/// Full request for `event`, at the default temperature.
pub fn build_request(event: &MentorEvent, user_name: &str, theme: &ThemeConfig) -> MentorRequest {
    MentorRequest {
        system: system_persona(user_name, theme),
        prompt: event_prompt(event, user_name, theme),
        temperature: DEFAULT_TEMPERATURE,
    }
}
