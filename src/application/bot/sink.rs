//! Telegram side of [`ReplySink`]

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::application::flows::{Choice, Reply, ReplySink};
use crate::core::result::AppResult;

/// Inline keyboard for button rows
pub fn keyboard(rows: &[Vec<Choice>]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(rows.iter().map(|row| {
        row.iter()
            .map(|c| InlineKeyboardButton::callback(c.label.clone(), c.action.clone()))
            .collect::<Vec<_>>()
    }))
}

/// Replies into one Telegram chat
#[derive(Clone)]
pub struct TelegramSink {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramSink {
    /// Bind a sink to a chat
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }
}

#[async_trait]
impl ReplySink for TelegramSink {
    async fn send(&self, reply: Reply) -> AppResult<()> {
        let request = self.bot.send_message(self.chat_id, reply.text);
        if reply.choices.is_empty() {
            request.await?;
        } else {
            request.reply_markup(keyboard(&reply.choices)).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::flows::main_menu;

    #[test]
    fn test_keyboard_keeps_rows() {
        let markup = keyboard(&main_menu());
        assert_eq!(markup.inline_keyboard.len(), 3);
        assert_eq!(markup.inline_keyboard[0][0].text, "💰 View wallet");
    }
}
