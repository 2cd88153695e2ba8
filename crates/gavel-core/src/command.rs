//! The sealed command registry: every token the bot understands is a variant
//! here, with its static gating traits. Built once, never mutated; unknown
//! tokens fall through to the "not implemented" terminal reply.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    RestrictMembers,
    PromoteMembers,
    InviteUsers,
}

impl Capability {
    /// The wording used in the "missing capability" reply.
    pub fn human_name(self) -> &'static str {
        match self {
            Capability::RestrictMembers => "restrict members",
            Capability::PromoteMembers => "promote members",
            Capability::InviteUsers => "invite users",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Menu,
    Hidetag,
    Tagall,
    Promote,
    Demote,
    Mute,
    Unmute,
    Kick,
    Ban,
    Unban,
    Grouplink,
    Listadmins,
    Welcome,
    Play,
    Ytsearch,
    Movie,
    Tiktok,
    Qrcode,
    Shorturl,
    Say,
    Dictionary,
    Wiki,
    Urban,
    Weather,
    Dog,
    Cat,
    Fact,
    Recipe,
}

impl Command {
    pub const ALL: [Command; 28] = [
        Command::Menu,
        Command::Hidetag,
        Command::Tagall,
        Command::Promote,
        Command::Demote,
        Command::Mute,
        Command::Unmute,
        Command::Kick,
        Command::Ban,
        Command::Unban,
        Command::Grouplink,
        Command::Listadmins,
        Command::Welcome,
        Command::Play,
        Command::Ytsearch,
        Command::Movie,
        Command::Tiktok,
        Command::Qrcode,
        Command::Shorturl,
        Command::Say,
        Command::Dictionary,
        Command::Wiki,
        Command::Urban,
        Command::Weather,
        Command::Dog,
        Command::Cat,
        Command::Fact,
        Command::Recipe,
    ];

    pub fn token(self) -> &'static str {
        match self {
            Command::Menu => "menu",
            Command::Hidetag => "hidetag",
            Command::Tagall => "tagall",
            Command::Promote => "promote",
            Command::Demote => "demote",
            Command::Mute => "mute",
            Command::Unmute => "unmute",
            Command::Kick => "kick",
            Command::Ban => "ban",
            Command::Unban => "unban",
            Command::Grouplink => "grouplink",
            Command::Listadmins => "listadmins",
            Command::Welcome => "welcome",
            Command::Play => "play",
            Command::Ytsearch => "ytsearch",
            Command::Movie => "movie",
            Command::Tiktok => "tiktok",
            Command::Qrcode => "qrcode",
            Command::Shorturl => "shorturl",
            Command::Say => "say",
            Command::Dictionary => "dictionary",
            Command::Wiki => "wiki",
            Command::Urban => "urban",
            Command::Weather => "weather",
            Command::Dog => "dog",
            Command::Cat => "cat",
            Command::Fact => "fact",
            Command::Recipe => "recipe",
        }
    }

    /// Direct, case-sensitive token lookup. No prefix or fuzzy matching.
    pub fn from_token(token: &str) -> Option<Command> {
        Command::ALL.iter().copied().find(|c| c.token() == token)
    }

    /// The capability the bot itself must hold before this command may touch
    /// group state. `None` for read-only commands.
    pub fn required_capability(self) -> Option<Capability> {
        match self {
            Command::Hidetag
            | Command::Tagall
            | Command::Mute
            | Command::Unmute
            | Command::Kick
            | Command::Ban
            | Command::Unban => Some(Capability::RestrictMembers),
            Command::Promote | Command::Demote => Some(Capability::PromoteMembers),
            Command::Grouplink => Some(Capability::InviteUsers),
            _ => None,
        }
    }

    pub fn group_only(self) -> bool {
        self.required_capability().is_some() || self == Command::Listadmins
    }

    /// For target-requiring commands, the verb used in the usage hint
    /// ("Reply to a user to <verb>.").
    pub fn target_action(self) -> Option<&'static str> {
        match self {
            Command::Promote => Some("promote"),
            Command::Demote => Some("demote"),
            Command::Mute => Some("mute"),
            Command::Unmute => Some("unmute"),
            Command::Kick => Some("kick"),
            Command::Ban => Some("ban"),
            Command::Unban => Some("unban"),
            _ => None,
        }
    }

    /// Usage line for commands that require an argument string.
    pub fn usage(self) -> Option<&'static str> {
        match self {
            Command::Welcome => Some(".welcome <message>"),
            Command::Play => Some(".play <song name>"),
            Command::Ytsearch => Some(".ytsearch <query>"),
            Command::Movie => Some(".movie <movie title>"),
            Command::Tiktok => Some(".tiktok <tiktok video url>"),
            Command::Qrcode => Some(".qrcode <text or url>"),
            Command::Shorturl => Some(".shorturl <long url>"),
            Command::Say => Some(".say <text>"),
            Command::Dictionary => Some(".dictionary <word>"),
            Command::Wiki => Some(".wiki <search term>"),
            Command::Urban => Some(".urban <term>"),
            Command::Weather => Some(".weather <city>"),
            Command::Recipe => Some(".recipe <dish>"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn registry_has_no_duplicate_tokens() {
        let tokens: HashSet<&str> = Command::ALL.iter().map(|c| c.token()).collect();
        assert_eq!(tokens.len(), Command::ALL.len());
    }

    #[test]
    fn every_token_round_trips_through_lookup() {
        for command in Command::ALL {
            assert_eq!(Command::from_token(command.token()), Some(command));
        }
    }

    #[test]
    fn lookup_is_exact_match_only() {
        assert_eq!(Command::from_token("WEATHER"), None);
        assert_eq!(Command::from_token("weath"), None);
        assert_eq!(Command::from_token("weatherx"), None);
    }

    #[test]
    fn target_requiring_commands_are_all_capability_gated() {
        for command in Command::ALL {
            if command.target_action().is_some() {
                assert!(
                    command.required_capability().is_some(),
                    "{} must be capability gated",
                    command.token()
                );
            }
        }
    }

    #[test]
    fn capability_table_matches_command_groups() {
        assert_eq!(
            Command::Mute.required_capability(),
            Some(Capability::RestrictMembers)
        );
        assert_eq!(
            Command::Promote.required_capability(),
            Some(Capability::PromoteMembers)
        );
        assert_eq!(
            Command::Grouplink.required_capability(),
            Some(Capability::InviteUsers)
        );
        assert_eq!(Command::Listadmins.required_capability(), None);
        assert!(Command::Listadmins.group_only());
        assert!(!Command::Weather.group_only());
    }
}
