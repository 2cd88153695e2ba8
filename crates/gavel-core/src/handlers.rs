//! Command handler bodies. Each handler runs its gate and target checks,
//! performs at most a handful of sequential platform or provider calls, and
//! returns the single reply the dispatcher sends.

use gavel_providers::Providers;

use crate::command::{Capability, Command};
use crate::context::{ChatContext, CommandInvocation};
use crate::error::{provider_err, CommandError};
use crate::gate::{authorize, ensure_group};
use crate::port::ChatPort;
use crate::qr;
use crate::reply::Reply;
use crate::target::resolve_target;

/// The original bot's fixed mute window. Not configurable; see DESIGN.md.
const MUTE_DURATION_SECS: i64 = 3600;

const MENU_TEXT: &str = "📋 *Available Commands*

*Group Admin*
.hidetag - Mention all members silently
.tagall - Mention all members
.promote - Promote user to admin
.demote - Demote admin
.mute - Restrict sending messages
.unmute - Unrestrict
.kick - Remove user
.ban - Ban user
.unban - Unban user
.grouplink - Get group invite link
.listadmins - List group admins
.welcome - Set welcome message

*Download*
.play <song> - Audio download link
.ytsearch <query> - Search YouTube
.movie <name> - Movie info (OMDb)
.tiktok <url> - Download TikTok video
.qrcode <text> - Generate QR code
.shorturl <url> - Shorten URL (is.gd)
.say <text> - Text to speech

*Search*
.dictionary <word> - Define word
.wiki <query> - Wikipedia summary
.urban <term> - Urban Dictionary
.weather <city> - Current weather
.dog - Random dog picture
.cat - Random cat picture
.fact - Random fact
.recipe <dish> - Recipe search";

pub async fn run(
    command: Command,
    chat: &dyn ChatPort,
    providers: &Providers,
    ctx: &ChatContext,
    invocation: &CommandInvocation,
) -> Result<Reply, CommandError> {
    match command {
        Command::Menu => Ok(Reply::Markdown(MENU_TEXT.to_string())),

        Command::Hidetag => tag_members(command, chat, ctx, true).await,
        Command::Tagall => tag_members(command, chat, ctx, false).await,

        Command::Promote => {
            authorize(chat, ctx, Capability::PromoteMembers).await?;
            let target = resolve_target(ctx, "promote")?;
            chat.grant_admin(ctx.chat_id, target.user_id)
                .await
                .map_err(CommandError::Upstream)?;
            Ok(Reply::Text("✅ User promoted successfully.".to_string()))
        }
        Command::Demote => {
            authorize(chat, ctx, Capability::PromoteMembers).await?;
            let target = resolve_target(ctx, "demote")?;
            chat.revoke_admin(ctx.chat_id, target.user_id)
                .await
                .map_err(CommandError::Upstream)?;
            Ok(Reply::Text("✅ User demoted successfully.".to_string()))
        }
        Command::Mute => {
            authorize(chat, ctx, Capability::RestrictMembers).await?;
            let target = resolve_target(ctx, "mute")?;
            let until = chrono::Utc::now().timestamp() + MUTE_DURATION_SECS;
            chat.restrict(ctx.chat_id, target.user_id, Some(until))
                .await
                .map_err(CommandError::Upstream)?;
            Ok(Reply::Text("✅ User muted for 1 hour.".to_string()))
        }
        Command::Unmute => {
            authorize(chat, ctx, Capability::RestrictMembers).await?;
            let target = resolve_target(ctx, "unmute")?;
            chat.unrestrict(ctx.chat_id, target.user_id)
                .await
                .map_err(CommandError::Upstream)?;
            Ok(Reply::Text("✅ User unmuted.".to_string()))
        }
        Command::Kick => {
            authorize(chat, ctx, Capability::RestrictMembers).await?;
            let target = resolve_target(ctx, "kick")?;
            // Same platform call as ban; see the flagged ambiguity in DESIGN.md.
            chat.ban(ctx.chat_id, target.user_id)
                .await
                .map_err(CommandError::Upstream)?;
            Ok(Reply::Text("✅ User kicked.".to_string()))
        }
        Command::Ban => {
            authorize(chat, ctx, Capability::RestrictMembers).await?;
            let target = resolve_target(ctx, "ban")?;
            chat.ban(ctx.chat_id, target.user_id)
                .await
                .map_err(CommandError::Upstream)?;
            Ok(Reply::Text("✅ User banned.".to_string()))
        }
        Command::Unban => {
            authorize(chat, ctx, Capability::RestrictMembers).await?;
            let target = resolve_target(ctx, "unban")?;
            chat.unban(ctx.chat_id, target.user_id)
                .await
                .map_err(CommandError::Upstream)?;
            Ok(Reply::Text("✅ User unbanned.".to_string()))
        }
        Command::Grouplink => {
            authorize(chat, ctx, Capability::InviteUsers).await?;
            let link = chat
                .invite_link(ctx.chat_id)
                .await
                .map_err(CommandError::Upstream)?;
            Ok(Reply::Text(format!("🔗 Group link: {}", link)))
        }
        Command::Listadmins => {
            ensure_group(ctx)?;
            let admins = chat
                .administrators(ctx.chat_id)
                .await
                .map_err(CommandError::Upstream)?;
            let mut list = String::new();
            for admin in &admins {
                list.push_str(&format!(
                    "- {} (@{})\n",
                    admin.display_name,
                    admin.username.as_deref().unwrap_or("no username")
                ));
            }
            Ok(Reply::Markdown(format!("👮 *Admins:*\n{}", list)))
        }
        Command::Welcome => {
            let message = require_args(command, invocation)?;
            Ok(Reply::Text(format!(
                "✅ Welcome message set to: \"{}\" (not persistent)",
                message
            )))
        }

        Command::Play => {
            let query = require_args(command, invocation)?;
            let link = providers.audio_download_url(query);
            Ok(Reply::Text(format!(
                "🎵 Search: {}\nDownload link (may not work): {}",
                query, link
            )))
        }
        Command::Ytsearch => {
            let query = require_args(command, invocation)?;
            let hits = providers
                .youtube_search(query)
                .await
                .map_err(provider_err("❌ No videos found."))?;
            let mut text = format!("🔍 *YouTube results for \"{}\":*\n\n", query);
            for (i, hit) in hits.iter().enumerate() {
                text.push_str(&format!(
                    "{}. [{}]({}) - {}\n",
                    i + 1,
                    hit.title,
                    hit.url,
                    hit.channel
                ));
            }
            Ok(Reply::Markdown(text))
        }
        Command::Movie => {
            let title = require_args(command, invocation)?;
            let movie = providers
                .movie(title)
                .await
                .map_err(provider_err("❌ Movie not found."))?;
            let caption = format!(
                "🎬 *{} ({})*\n⭐ *IMDb Rating:* {}\n🎭 *Genre:* {}\n🎥 *Director:* {}\n📝 *Plot:* {}",
                movie.title, movie.year, movie.imdb_rating, movie.genre, movie.director, movie.plot
            );
            match movie.poster {
                Some(poster) => Ok(Reply::Photo {
                    url: poster,
                    caption: Some(caption),
                    markdown: true,
                }),
                None => Ok(Reply::Markdown(caption)),
            }
        }
        Command::Tiktok => {
            let url = require_first_arg(command, invocation)?;
            let link = providers
                .tiktok_download(url)
                .await
                .map_err(provider_err("❌ Failed to download that video."))?;
            Ok(Reply::Text(format!("✅ Download link: {}", link)))
        }
        Command::Qrcode => {
            let text = require_args(command, invocation)?;
            let png = qr::encode_png(text).map_err(CommandError::Internal)?;
            Ok(Reply::PhotoPng {
                png,
                caption: Some("✅ QR code generated".to_string()),
            })
        }
        Command::Shorturl => {
            let url = require_first_arg(command, invocation)?;
            let short = providers
                .shorten_url(url)
                .await
                .map_err(provider_err("❌ That URL cannot be shortened."))?;
            Ok(Reply::Text(format!("✅ Shortened URL: {}", short)))
        }
        Command::Say => {
            let text = require_args(command, invocation)?;
            Ok(Reply::Voice {
                url: providers.tts_url(text),
            })
        }

        Command::Dictionary => {
            let word = require_first_arg(command, invocation)?;
            let entry = providers
                .dictionary(word)
                .await
                .map_err(provider_err("❌ Word not found."))?;
            let example = entry
                .example
                .map(|e| format!("\n📝 *Example:* {}", e))
                .unwrap_or_default();
            Ok(Reply::Markdown(format!(
                "📖 *{}*\n*Part of speech:* {}\n*Definition:* {}{}",
                entry.word, entry.part_of_speech, entry.definition, example
            )))
        }
        Command::Wiki => {
            let query = require_args(command, invocation)?;
            let summary = providers
                .wiki_summary(query)
                .await
                .map_err(provider_err("❌ Wikipedia page not found."))?;
            if summary.disambiguation {
                return Ok(Reply::Text(
                    "❌ Your query is ambiguous. Try a more specific term.".to_string(),
                ));
            }
            let text = format!("📚 *{}*\n{}", summary.title, summary.extract);
            match summary.thumbnail {
                Some(thumbnail) => Ok(Reply::Photo {
                    url: thumbnail,
                    caption: Some(text),
                    markdown: true,
                }),
                None => Ok(Reply::Markdown(text)),
            }
        }
        Command::Urban => {
            let term = require_args(command, invocation)?;
            let def = providers
                .urban(term)
                .await
                .map_err(provider_err("❌ No definitions found."))?;
            Ok(Reply::Markdown(format!(
                "📙 *{}*\n*Definition:* {}\n*Example:* {}",
                term, def.definition, def.example
            )))
        }
        Command::Weather => {
            let city = require_args(command, invocation)?;
            let report = providers
                .weather(city)
                .await
                .map_err(provider_err("❌ City not found."))?;
            Ok(Reply::Markdown(format!(
                "🌍 *Weather in {}, {}*\n🌡️ Temperature: {}°C (feels like {}°C)\n☁️ Conditions: {}\n💧 Humidity: {}%\n💨 Wind: {} m/s",
                report.city,
                report.country,
                report.temp_c,
                report.feels_like_c,
                report.description,
                report.humidity,
                report.wind_speed
            )))
        }
        Command::Dog => {
            let url = providers
                .random_dog()
                .await
                .map_err(provider_err("❌ Failed to fetch a dog picture."))?;
            Ok(Reply::Photo {
                url,
                caption: None,
                markdown: false,
            })
        }
        Command::Cat => {
            let url = providers
                .random_cat()
                .await
                .map_err(provider_err("❌ Failed to fetch a cat picture."))?;
            Ok(Reply::Photo {
                url,
                caption: None,
                markdown: false,
            })
        }
        Command::Fact => {
            let fact = providers
                .random_fact()
                .await
                .map_err(provider_err("❌ Failed to fetch a fact."))?;
            Ok(Reply::Markdown(format!("🧠 *Random Fact:* {}", fact)))
        }
        Command::Recipe => {
            let dish = require_args(command, invocation)?;
            let hits = providers
                .recipes(dish)
                .await
                .map_err(provider_err("❌ No recipes found."))?;
            let mut text = format!("🍽️ *Recipes for \"{}\":*\n\n", dish);
            for (i, hit) in hits.iter().enumerate() {
                text.push_str(&format!(
                    "{}. [{}]({})\n   Calories: {}\n",
                    i + 1,
                    hit.label,
                    hit.url,
                    hit.calories
                ));
            }
            Ok(Reply::Markdown(text))
        }
    }
}

/// Only the administrators are guaranteed fetchable, so "all members" tags
/// the admin set, as the original bot did.
async fn tag_members(
    command: Command,
    chat: &dyn ChatPort,
    ctx: &ChatContext,
    silent: bool,
) -> Result<Reply, CommandError> {
    authorize(chat, ctx, Capability::RestrictMembers).await?;
    let admins = chat
        .administrators(ctx.chat_id)
        .await
        .map_err(CommandError::Upstream)?;

    let mut mentions = String::new();
    for admin in admins.iter().filter(|a| !a.is_bot) {
        mentions.push_str(&format!(
            "[{}](tg://user?id={}) ",
            admin.display_name, admin.user_id
        ));
    }
    if mentions.is_empty() {
        mentions.push_str("No members found");
    }

    let header = if command == Command::Hidetag {
        "👥 *Members*"
    } else {
        "👥 *All Members*"
    };
    let text = format!("{}\n{}", header, mentions);
    if silent {
        Ok(Reply::SilentMarkdown(text))
    } else {
        Ok(Reply::Markdown(text))
    }
}

fn require_args<'a>(
    command: Command,
    invocation: &'a CommandInvocation,
) -> Result<&'a str, CommandError> {
    let args = invocation.args.trim();
    if args.is_empty() {
        return Err(CommandError::Usage(
            command.usage().unwrap_or("missing argument"),
        ));
    }
    Ok(args)
}

fn require_first_arg<'a>(
    command: Command,
    invocation: &'a CommandInvocation,
) -> Result<&'a str, CommandError> {
    invocation.first_arg().ok_or(CommandError::Usage(
        command.usage().unwrap_or("missing argument"),
    ))
}
