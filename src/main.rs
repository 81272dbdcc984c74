use std::sync::Arc;

use reqwest::Url;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{
    ChatAction, FileId, InlineKeyboardButton, InlineKeyboardMarkup, MenuButton, WebAppInfo,
};
use teloxide::utils::command::BotCommands;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;

use pravka::config::Config;
use pravka::deepgram::Transcriber;
use pravka::openrouter::Client as OpenRouterClient;
use pravka::{editor, webapp};

struct BotState {
    config: Config,
    openrouter: OpenRouterClient,
    transcriber: Option<Transcriber>,
}

impl BotState {
    fn new(config: Config) -> Self {
        let openrouter = OpenRouterClient::new(
            config.openrouter_api_key.clone(),
            config.referer.clone(),
            config.title.clone(),
        );
        let transcriber = config.deepgram_api_key.clone().map(Transcriber::new);

        Self {
            config,
            openrouter,
            transcriber,
        }
    }
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
enum Command {
    Start,
    App,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    let bot = Bot::new(config.telegram_bot_token.clone());
    let state = Arc::new(BotState::new(config));

    info!("🚀 Starting pravka...");
    info!("Completion model: {}", state.config.chat_model);
    if state.transcriber.is_none() {
        info!("Speech recognition disabled (DEEPGRAM_API_KEY not set)");
    }
    if state.config.web_app_url.is_none() {
        info!("Mini-app disabled (WEB_APP_URL not set)");
    }

    let handler = Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(
            dptree::filter(|msg: Message| msg.web_app_data().is_some())
                .endpoint(handle_web_app_data),
        )
        .branch(dptree::filter(|msg: Message| msg.voice().is_some()).endpoint(handle_voice))
        .branch(dptree::filter(|msg: Message| msg.text().is_some()).endpoint(handle_text));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Bot stopped.");
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<BotState>,
) -> ResponseResult<()> {
    match cmd {
        Command::Start => handle_start(bot, msg, state).await,
        Command::App => handle_app(bot, msg, state).await,
    }
}

async fn handle_start(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    bot.send_message(
        msg.chat.id,
        "Привет! Пришли мне текст или голосовое сообщение — я исправлю текст и верну результат.",
    )
    .await?;

    if let Some(ref url) = state.config.web_app_url {
        // Best effort: the bot works fine without the menu button.
        let menu = MenuButton::WebApp {
            text: "Open App".to_string(),
            web_app: WebAppInfo { url: url.clone() },
        };
        if let Err(e) = bot.set_chat_menu_button().menu_button(menu).await {
            warn!("Failed to set chat menu button: {e}");
        }

        bot.send_message(msg.chat.id, "Открыть мини‑приложение")
            .reply_markup(web_app_keyboard(url.clone()))
            .await?;
    }

    Ok(())
}

async fn handle_app(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let Some(ref url) = state.config.web_app_url else {
        bot.send_message(
            msg.chat.id,
            "WEB_APP_URL не задан. Укажите HTTPS ссылку в переменных окружения.",
        )
        .await?;
        return Ok(());
    };

    bot.send_message(msg.chat.id, "Открыть мини‑приложение")
        .reply_markup(web_app_keyboard(url.clone()))
        .await?;

    Ok(())
}

fn web_app_keyboard(url: Url) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::web_app(
        "Open",
        WebAppInfo { url },
    )]])
}

async fn handle_web_app_data(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let raw = match msg.web_app_data() {
        Some(data) => data.data.clone(),
        None => return Ok(()),
    };

    let payload = match webapp::parse(&raw) {
        Ok(payload) => payload,
        Err(webapp::ParseError::Unsupported) => {
            bot.send_message(msg.chat.id, "Неподдерживаемый формат данных из WebApp")
                .await?;
            return Ok(());
        }
        Err(webapp::ParseError::Json(e)) => {
            warn!("web_app_data parse error: {e}");
            bot.send_message(msg.chat.id, "Не удалось обработать данные мини‑приложения")
                .await?;
            return Ok(());
        }
    };

    match payload {
        webapp::Payload::Text { text } => {
            bot.send_chat_action(msg.chat.id, ChatAction::Typing).await?;
            let text = text.trim();
            if text.is_empty() {
                bot.send_message(msg.chat.id, "Пустой текст").await?;
                return Ok(());
            }
            match editor::correct_text(
                text,
                &state.openrouter,
                &state.config.chat_model,
                state.config.max_tokens,
            )
            .await
            {
                Ok(corrected) => {
                    bot.send_message(msg.chat.id, corrected).await?;
                }
                Err(e) => {
                    warn!("Correction failed for web-app text: {e}");
                    bot.send_message(msg.chat.id, "Не удалось обработать данные мини‑приложения")
                        .await?;
                }
            }
        }
        webapp::Payload::Lookup { text } => {
            bot.send_chat_action(msg.chat.id, ChatAction::Typing).await?;
            let query = text.trim();
            if query.is_empty() {
                bot.send_message(msg.chat.id, "Пустой запрос").await?;
                return Ok(());
            }
            match editor::lookup_brief(query, &state.openrouter, &state.config.chat_model).await {
                Ok(info) if !info.is_empty() => {
                    bot.send_message(msg.chat.id, info).await?;
                }
                Ok(_) => {
                    bot.send_message(msg.chat.id, "Нет данных").await?;
                }
                Err(e) => {
                    warn!("Lookup failed: {e}");
                    bot.send_message(msg.chat.id, "Не удалось обработать данные мини‑приложения")
                        .await?;
                }
            }
        }
    }

    Ok(())
}

async fn handle_text(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    bot.send_chat_action(msg.chat.id, ChatAction::Typing).await?;

    let text = text.trim();
    if text.is_empty() {
        bot.send_message(msg.chat.id, "Пустое сообщение. Отправьте текст для исправления.")
            .await?;
        return Ok(());
    }

    match editor::correct_text(
        text,
        &state.openrouter,
        &state.config.chat_model,
        state.config.max_tokens,
    )
    .await
    {
        Ok(corrected) => {
            bot.send_message(msg.chat.id, corrected).await?;
        }
        Err(e) => {
            warn!("Correction failed: {e}");
            bot.send_message(msg.chat.id, "Упс! Что-то пошло не так. Попробуйте ещё раз позже.")
                .await?;
        }
    }

    Ok(())
}

async fn handle_voice(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let Some(voice) = msg.voice() else {
        return Ok(());
    };

    bot.send_chat_action(msg.chat.id, ChatAction::Typing).await?;

    let audio = match download_voice(&bot, voice.file.id.clone()).await {
        Ok(audio) => audio,
        Err(e) => {
            warn!("Voice download failed: {e}");
            bot.send_message(
                msg.chat.id,
                "Не удалось обработать голосовое сообщение. Попробуйте ещё раз позже.",
            )
            .await?;
            return Ok(());
        }
    };

    let Some(ref transcriber) = state.transcriber else {
        bot.send_message(
            msg.chat.id,
            "Распознавание речи отключено. Укажите DEEPGRAM_API_KEY, чтобы включить.",
        )
        .await?;
        return Ok(());
    };

    let transcript = match transcriber.transcribe(audio).await {
        Ok(transcript) => transcript,
        Err(e) => {
            warn!("Transcription failed: {e}");
            bot.send_message(
                msg.chat.id,
                "Не удалось обработать голосовое сообщение. Попробуйте ещё раз позже.",
            )
            .await?;
            return Ok(());
        }
    };

    let transcript = transcript.trim();
    if transcript.is_empty() {
        bot.send_message(msg.chat.id, "Не удалось распознать речь. Попробуйте ещё раз.")
            .await?;
        return Ok(());
    }

    info!("Transcribed voice message: \"{transcript}\"");

    match editor::correct_text(
        transcript,
        &state.openrouter,
        &state.config.chat_model,
        state.config.max_tokens,
    )
    .await
    {
        Ok(corrected) => {
            bot.send_message(msg.chat.id, corrected).await?;
        }
        Err(e) => {
            warn!("Correction of transcript failed: {e}");
            bot.send_message(
                msg.chat.id,
                "Не удалось обработать голосовое сообщение. Попробуйте ещё раз позже.",
            )
            .await?;
        }
    }

    Ok(())
}

async fn download_voice(bot: &Bot, file_id: FileId) -> Result<Vec<u8>, String> {
    let file = bot
        .get_file(file_id)
        .await
        .map_err(|e| format!("failed to resolve voice file: {e}"))?;

    let mut data = Vec::new();
    bot.download_file(&file.path, &mut data)
        .await
        .map_err(|e| format!("failed to download voice file: {e}"))?;

    Ok(data)
}
