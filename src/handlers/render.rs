use crate::models::{MAX_SELECT_OPTIONS, Poll};
use crate::voting::{PollSummary, ResultGroup, strip_tokens};
use log::warn;
use serenity::builder::{CreateComponents, CreateEmbed};
use serenity::model::Timestamp;
use serenity::model::application::component::ButtonStyle;

const ACTIVE_COLOUR: u32 = 0x5865F2;
const EXPIRED_COLOUR: u32 = 0x5C5C5C;
const MAX_ACTION_ROWS: usize = 5;
const MAX_EMBED_FIELDS: usize = 25;
const MAX_FIELD_NAME: usize = 256;
const MAX_FIELD_VALUE: usize = 1024;
const MAX_LABEL: usize = 100;
const MAX_PLACEHOLDER: usize = 150;
const SPACER: &str = "\u{200b}";

/// One select menu on the poll panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteMenu {
    pub custom_id: String,
    pub placeholder: String,
    /// (label, option key)
    pub choices: Vec<(String, String)>,
}

/// Select menus for a poll, leaving one action row for the export button.
/// Returns the menus and how many keyed options could not be offered.
pub fn voting_menus(poll: &Poll) -> (Vec<VoteMenu>, usize) {
    let mut menus = Vec::new();

    if poll.sections.is_empty() {
        let choices = poll
            .options
            .iter()
            .take(MAX_SELECT_OPTIONS)
            .map(|(key, text)| (label_for(text), key.to_string()))
            .collect();
        menus.push(VoteMenu {
            custom_id: format!("poll_select_{}", poll.id),
            placeholder: "Selecciona tu opción...".to_string(),
            choices,
        });
    } else {
        let entries = poll.section_options();
        for (index, section) in poll.sections.keys().enumerate() {
            if menus.len() == MAX_ACTION_ROWS - 1 {
                break;
            }
            let choices: Vec<(String, String)> = entries
                .iter()
                .filter(|e| e.section == section)
                .filter_map(|e| e.key.map(|key| (label_for(e.text), key.to_string())))
                .filter(|(label, _)| !label.is_empty())
                .take(MAX_SELECT_OPTIONS)
                .collect();
            if choices.is_empty() {
                continue;
            }
            menus.push(VoteMenu {
                custom_id: format!("poll_section_{}_{}", index, poll.id),
                placeholder: truncate(&format!("{}...", strip_tokens(section)), MAX_PLACEHOLDER),
                choices,
            });
        }
    }

    let offered: usize = menus.iter().map(|m| m.choices.len()).sum();
    (menus, poll.options.len().saturating_sub(offered))
}

fn label_for(text: &str) -> String {
    truncate(&strip_tokens(text), MAX_LABEL)
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max - 3).collect();
        format!("{}...", kept)
    }
}

pub fn poll_components<'a>(
    components: &'a mut CreateComponents,
    poll_id: &str,
    menus: &[VoteMenu],
) -> &'a mut CreateComponents {
    for menu in menus {
        components.create_action_row(|row| {
            row.create_select_menu(|select| {
                select
                    .custom_id(&menu.custom_id)
                    .placeholder(&menu.placeholder)
                    .min_values(1)
                    .max_values(1)
                    .options(|options| {
                        for (label, key) in &menu.choices {
                            options.create_option(|option| option.label(label).value(key));
                        }
                        options
                    })
            })
        });
    }
    components.create_action_row(|row| {
        row.create_button(|button| {
            button
                .custom_id(format!("export_poll_{}", poll_id))
                .label("📊 Exportar")
                .style(ButtonStyle::Secondary)
        })
    })
}

pub fn poll_embed<'a>(embed: &'a mut CreateEmbed, poll: &Poll, summary: &PollSummary) -> &'a mut CreateEmbed {
    embed
        .title(format!("🗳️ {}", poll.question))
        .color(if summary.expired { EXPIRED_COLOUR } else { ACTIVE_COLOUR });

    if let Some(description) = &poll.description {
        embed.description(format!("*{}*", description));
    }

    let mut fields = 0;
    for (i, group) in summary.groups.iter().enumerate() {
        if fields + 1 > MAX_EMBED_FIELDS {
            break;
        }
        embed.field(field_name(group), field_value(group), true);
        fields += 1;

        // Three inline columns per row.
        if (i + 1) % 3 == 0 && i + 1 < summary.groups.len() && fields + 2 <= MAX_EMBED_FIELDS {
            embed.field(SPACER, SPACER, false);
            fields += 1;
        }
    }

    if summary.groups.is_empty() {
        let status = if summary.expired {
            "Esta encuesta ha finalizado sin votos"
        } else {
            "Aún no hay votos - ¡sé el primero en participar!"
        };
        embed.field("👥 Estado", status, false);
    }

    match Timestamp::from_unix_timestamp(poll.created_at.timestamp()) {
        Ok(created) => {
            embed.timestamp(created);
        }
        Err(why) => warn!("Poll {} has an unrepresentable creation time: {:?}", poll.id, why),
    }

    embed.footer(|footer| footer.text(footer_text(summary)))
}

fn field_name(group: &ResultGroup) -> String {
    if group.is_empty() {
        truncate(&format!("**{}**", group.name), MAX_FIELD_NAME)
    } else {
        let count = format!(" ({})", group.count);
        let name = truncate(&format!("**{}**", group.name), MAX_FIELD_NAME - count.chars().count());
        format!("{}{}", name, count)
    }
}

// Empty sections read as a placeholder, in italics.
fn field_value(group: &ResultGroup) -> String {
    let value = group.lines.join("\n");
    if group.is_empty() {
        truncate(&format!("*{}*", value), MAX_FIELD_VALUE)
    } else {
        truncate(&value, MAX_FIELD_VALUE)
    }
}

fn footer_text(summary: &PollSummary) -> String {
    let mut text = format!("Total de participantes: {}", summary.total_participants);
    if summary.expired {
        text.push_str(" • 🔒 Esta encuesta ha finalizado");
    } else if let Some(days) = summary.days_remaining {
        let plural = if days == 1 { "" } else { "s" };
        text.push_str(&format!(" • ⏰ Tiempo restante: {} día{}", days, plural));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderedMap;
    use crate::manager::{NewPoll, build_poll};
    use crate::models::fixtures::{poll_with_sections, user};
    use crate::voting::results::NO_VOTES;
    use chrono::Utc;

    #[test]
    fn one_menu_per_section() {
        let poll = poll_with_sections(&[(":tank: Rol", ":tank: Tank,DPS"), ("Dia", "Lunes")]);
        let (menus, hidden) = voting_menus(&poll);
        assert_eq!(hidden, 0);
        assert_eq!(menus.len(), 2);
        assert_eq!(menus[0].custom_id, format!("poll_section_0_{}", poll.id));
        assert_eq!(menus[0].placeholder, "Rol...");
        assert_eq!(
            menus[0].choices,
            vec![("Tank".to_string(), "option0".to_string()), ("DPS".to_string(), "option1".to_string())]
        );
        assert_eq!(menus[1].choices, vec![("Lunes".to_string(), "option2".to_string())]);
    }

    #[test]
    fn section_menus_leave_a_row_for_export() {
        let poll = poll_with_sections(&[("A", "a"), ("B", "b"), ("C", "c"), ("D", "d"), ("E", "e")]);
        let (menus, hidden) = voting_menus(&poll);
        assert_eq!(menus.len(), MAX_ACTION_ROWS - 1);
        assert_eq!(hidden, 1);
    }

    #[test]
    fn flat_menu_caps_at_select_limit() {
        let texts: Vec<String> = (0..30).map(|i| format!("o{}", i)).collect();
        let joined = texts.join(",");
        let mut poll = poll_with_sections(&[("A", joined.as_str())]);
        poll.sections = OrderedMap::new();
        let (menus, hidden) = voting_menus(&poll);
        assert_eq!(menus.len(), 1);
        assert_eq!(menus[0].custom_id, format!("poll_select_{}", poll.id));
        assert_eq!(menus[0].choices.len(), MAX_SELECT_OPTIONS);
        assert_eq!(hidden, 5);
    }

    #[test]
    fn repeated_headers_offer_every_option() {
        let poll = build_poll(
            NewPoll {
                sections_text: "[A]\nx\n[B]\ny\n[A]\nz".to_string(),
                question: "q".to_string(),
                description: None,
                duration_days: None,
                voting_roles: None,
                author: user("1", "author"),
                channel_id: "42".to_string(),
            },
            Utc::now(),
        )
        .unwrap();
        let (menus, hidden) = voting_menus(&poll);
        assert_eq!(hidden, 0);
        let labels: Vec<Vec<&str>> = menus
            .iter()
            .map(|m| m.choices.iter().map(|(label, _)| label.as_str()).collect())
            .collect();
        assert_eq!(labels, vec![vec!["x", "z"], vec!["y"]]);
    }

    #[test]
    fn field_names_fit_discord_limit() {
        let group = ResultGroup {
            name: "S".repeat(400),
            count: 3,
            lines: vec!["• ana".to_string()],
        };
        let name = field_name(&group);
        assert!(name.chars().count() <= MAX_FIELD_NAME);
        assert!(name.ends_with("... (3)"));

        let empty = ResultGroup {
            name: "Dia".to_string(),
            count: 0,
            lines: vec![NO_VOTES.to_string()],
        };
        assert_eq!(field_name(&empty), "**Dia**");
        assert_eq!(field_value(&empty), "*Sin votos*");
        assert_eq!(field_value(&group), "• ana");
    }

    #[test]
    fn long_labels_are_truncated() {
        let long = "x".repeat(120);
        let label = label_for(&long);
        assert_eq!(label.chars().count(), MAX_LABEL);
        assert!(label.ends_with("..."));
    }

    #[test]
    fn footer_mentions_time_left() {
        let summary = PollSummary {
            expired: false,
            days_remaining: Some(1),
            groups: Vec::new(),
            total_participants: 4,
        };
        assert_eq!(footer_text(&summary), "Total de participantes: 4 • ⏰ Tiempo restante: 1 día");

        let expired = PollSummary {
            expired: true,
            days_remaining: None,
            ..summary
        };
        assert_eq!(footer_text(&expired), "Total de participantes: 4 • 🔒 Esta encuesta ha finalizado");
    }
}
