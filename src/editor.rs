//! Correction and lookup prompts over the completion client.

use crate::openrouter::{Client, Error, Message, Role};

/// Both request kinds run near-deterministic.
const TEMPERATURE: f32 = 0.2;

/// Lookups are short; they get a smaller budget than corrections.
const LOOKUP_MAX_TOKENS: u32 = 256;

const EDITOR_PROMPT: &str = "Ты помощник-редактор. Исправляй орфографию, грамматику и пунктуацию. \
Верни четыре строки строго в этом формате без лишнего текста и маркдауна:\n\
Оригинальный текст: <оригинальный текст>\n\
Исправленный текст: <исправленный текст>\n\
Перевод: <если исходный язык английский — переведи на русский; если русский — на английский>\n\
Объяснение: <1–3 коротких пункта, какие правки внесены и почему>";

/// Correct spelling, grammar and punctuation in `text`.
///
/// Never returns an empty string for non-empty input: if the model comes
/// back with nothing, the caller gets the original text unchanged.
pub async fn correct_text(
    text: &str,
    client: &Client,
    model: &str,
    max_tokens: u32,
) -> Result<String, Error> {
    let messages = [
        Message {
            role: Role::System,
            content: EDITOR_PROMPT.to_string(),
        },
        Message {
            role: Role::User,
            content: text.to_string(),
        },
    ];

    let output = client
        .complete(model, &messages, TEMPERATURE, max_tokens)
        .await?;

    Ok(fallback_to_input(&output, text))
}

/// Short bilingual gloss for a word or phrase.
///
/// Returns an empty string when the model has nothing to say; the caller
/// substitutes its own "no data" reply.
pub async fn lookup_brief(query: &str, client: &Client, model: &str) -> Result<String, Error> {
    let prompt = format!(
        "Ты двуязычный лингвист. Для фразы или слова:\n\
\"{query}\"\n\
Дай краткий вывод в 3–5 строках:\n\
1) Translation (RU↔EN)\n\
2) Meaning (кратко)\n\
3) Examples (2 очень коротких примера)\n\
Форматируй кратко, без лишних пояснений."
    );

    let messages = [Message {
        role: Role::User,
        content: prompt,
    }];

    let output = client
        .complete(model, &messages, TEMPERATURE, LOOKUP_MAX_TOKENS)
        .await?;

    Ok(output.trim().to_string())
}

fn fallback_to_input(output: &str, input: &str) -> String {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        input.to_string()
    } else {
        trimmed.to_string()
    }
}
