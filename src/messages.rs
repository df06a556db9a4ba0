//! Markdown posted to GitHub: comments, issue titles, and report bodies.
//!
//! Every text exists in English and Czech. The Czech texts speak as the
//! eggtray bot in the neuter gender.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::model::{Outcome, Profile, Status, Summary, is_ready};

const CANDIDATES_URL: &str = "https://junior.guru/candidates/";

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Cs,
}

fn profile_link(username: &str) -> String {
    format!("[github.com/{username}](https://github.com/{username})")
}

fn status_color(status: Status) -> &'static str {
    match status {
        Status::Error => "🔴",
        Status::Warning => "🟠",
        Status::Info => "🔵",
        Status::Done => "🟢",
    }
}

const FOOTER_RULE: &str = "\n\n---\n\n";

/// Footer linking to the workflow run, if there is one.
pub fn run_footer(locale: Locale, run_url: Option<&str>) -> String {
    let Some(run_url) = run_url else {
        return String::new();
    };
    let label = match locale {
        Locale::En => "Log of my work",
        Locale::Cs => "Záznam mojí práce",
    };
    format!("{FOOTER_RULE}[{label}]({run_url})")
}

/// `body` without the run link appended by [`run_footer`].
pub fn strip_run_footer(body: &str) -> &str {
    match body.rsplit_once(FOOTER_RULE) {
        Some((content, link))
            if link.starts_with('[') && link.ends_with(')') && !link.contains('\n') =>
        {
            content
        }
        _ => body,
    }
}

/// Markdown table with one row per outcome.
pub fn render_table(locale: Locale, outcomes: &[Outcome]) -> String {
    let (verdict, description, explanation, why) = match locale {
        Locale::En => ("Verdict", "Description", "Explanation", "Why?"),
        Locale::Cs => ("Verdikt", "Popis", "Vysvětlení", "Proč?"),
    };
    let mut table = format!(
        "| {verdict} | {description} | {explanation} |\n|---------|-------|------------|\n"
    );
    for outcome in outcomes {
        let _ = writeln!(
            table,
            "| {} | {} | [{why}]({}) |",
            status_color(outcome.status),
            table_cell(&outcome.message),
            outcome.docs_url
        );
    }
    table
}

/// Keeps text inside one table cell.
fn table_cell(text: &str) -> String {
    text.replace('|', "\\|")
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
}

pub fn check_title(locale: Locale, username: &str) -> String {
    match locale {
        Locale::En => format!("Feedback on profile @{username}"),
        Locale::Cs => format!("Zpětná vazba na profil @{username}"),
    }
}

pub fn report_title(locale: Locale, username: &str) -> String {
    match locale {
        Locale::En => format!("Profile @{username} has issues"),
        Locale::Cs => format!("Profil @{username} má nedostatky"),
    }
}

/// Posted right before the (slow) profile check starts.
pub fn wait_comment(locale: Locale, username: &str, run_url: Option<&str>) -> String {
    let link = profile_link(username);
    match (locale, run_url) {
        (Locale::En, Some(run_url)) => format!(
            "Hi!\n\n🔬 I see you'd like feedback on the GitHub profile {link}. \
             Alright, on it! Once I'm done, the results will show up here and I'll close this issue.\n\n\
             ⏳ Going through large profiles takes me a few minutes, so if nothing happens for a while, \
             you can [watch me work]({run_url}). Or look out of the window and stretch your back."
        ),
        (Locale::En, None) => format!(
            "Hi!\n\n🔬 I see you'd like feedback on the GitHub profile {link}. \
             Alright, on it! Once I'm done, the results will show up here and I'll close this issue.\n\n\
             ⏳ Going through large profiles takes me a few minutes, so go stretch your back meanwhile."
        ),
        (Locale::Cs, Some(run_url)) => format!(
            "Ahoj!\n\n🔬 Koukám, že chceš, abych ti dalo zpětnou vazbu na GitHub profil {link}. \
             Tak jo, letím na to! Až budu mít hotovo, objeví se tady výsledky a zavřu tohle issue.\n\n\
             ⏳ Projít velké profily mi trvá i několik minut, tak pokud se dlouho nic neděje, \
             můžeš mi [koukat pod zobáček]({run_url}). Ale možná se spíš koukni z okna a protáhni si záda."
        ),
        (Locale::Cs, None) => format!(
            "Ahoj!\n\n🔬 Koukám, že chceš, abych ti dalo zpětnou vazbu na GitHub profil {link}. \
             Tak jo, letím na to! Až budu mít hotovo, objeví se tady výsledky a zavřu tohle issue.\n\n\
             ⏳ Projít velké profily mi trvá i několik minut, tak si zatím třeba protáhni záda."
        ),
    }
}

pub fn missing_profile_comment(locale: Locale, username: &str, run_url: Option<&str>) -> String {
    let link = profile_link(username);
    let text = match locale {
        Locale::En => format!(
            "Hi! Looks like you want me to look at the profile {link}, but it doesn't seem to exist 🤷"
        ),
        Locale::Cs => format!(
            "Ahoj! Vypadá to, že chceš, ať se podívám na profil {link}, jenže ten podle všeho neexistuje 🤷"
        ),
    };
    text + &run_footer(locale, run_url)
}

/// The result of a profile check: either the error or the verdict with a
/// table of outcomes, followed by the raw summary as collapsible JSON.
pub fn summary_comment(
    locale: Locale,
    summary: &Summary,
    run_url: Option<&str>,
) -> serde_json::Result<String> {
    let mut text = if let Some(error) = &summary.error {
        match locale {
            Locale::En => format!(
                "I looked at the profile, but unfortunately it ended with an error 🤕\n```\n{error}\n```\n\
                 Someone from the team will take a look."
            ),
            Locale::Cs => format!(
                "Na profil jsem kouklo, ale bohužel to skončilo chybou 🤕\n```\n{error}\n```\n\
                 Někdo z týmu se na to podívá."
            ),
        }
    } else {
        let link = profile_link(&summary.username);
        let ready = is_ready(&summary.outcomes);
        let mut text = match (locale, ready) {
            (Locale::En, true) => format!(
                "I went carefully through the whole profile {link} and here is my feedback 🔬\n\n\
                 I see no major shortcomings, so feel free to look for a job in tech! 💪 \
                 If you can, create a profile at [junior.guru/candidates]({CANDIDATES_URL})!\n\n"
            ),
            (Locale::En, false) => format!(
                "I went carefully through the whole profile {link} and here is my feedback 🔬\n\n\
                 I see major shortcomings 🔴 Fix them before you start looking for a job. \
                 Feel free to have it checked here again afterwards. \
                 Once it's OK, don't forget to create a profile at [junior.guru/candidates]({CANDIDATES_URL})!\n\n"
            ),
            (Locale::Cs, true) => format!(
                "Tak jsem si poctivě prošlo celý profil {link} a tady je moje zpětná vazba 🔬\n\n\
                 Nevidím žádné zásadní nedostatky, takže si klidně můžeš hledat práci v oboru! 💪 \
                 Pokud to dokážeš, vytvoř si profil na [junior.guru/candidates]({CANDIDATES_URL})!\n\n"
            ),
            (Locale::Cs, false) => format!(
                "Tak jsem si poctivě prošlo celý profil {link} a tady je moje zpětná vazba 🔬\n\n\
                 Vidím zásadní nedostatky 🔴 Oprav si to, než si začneš hledat práci. \
                 Klidně si to tady pak znovu nech zkontrolovat. \
                 Až to bude OK, nezapomeň si vytvořit profil na [junior.guru/candidates]({CANDIDATES_URL})!\n\n"
            ),
        };
        text.push_str(&render_table(locale, &summary.outcomes));
        text
    };

    let details = match locale {
        Locale::En => "Results as JSON",
        Locale::Cs => "Výsledky jako JSON",
    };
    let json = serde_json::to_string_pretty(summary)?;
    let _ = write!(
        text,
        "\n\n<details>\n\n<summary>{details}</summary>\n\n```json\n{json}\n```\n\n</details>"
    );
    text.push_str(&run_footer(locale, run_url));
    Ok(text)
}

/// Body of the report issue tracking a profile that isn't ready.
pub fn report_body(locale: Locale, profile: &Profile, run_url: Option<&str>) -> String {
    let username = &profile.github_username;
    let mut text = match locale {
        Locale::En => format!(
            "During a routine check of the profile by @{username} I found the following shortcomings 🚨 \
             Until everything is OK, **the profile isn't ready for job hunting** and it will be \
             pushed back at [junior.guru/candidates]({CANDIDATES_URL}) 💔\n\n\
             I'll check it again every day and as soon as everything is fine, I'll close this issue.\n\n"
        ),
        Locale::Cs => format!(
            "Při namátkové kontrole profilu od @{username} jsem našlo následující nedostatky 🚨 \
             Dokud nebude všechno OK, tak **profil není připravený na hledání práce** a na \
             [junior.guru/candidates]({CANDIDATES_URL}) bude upozaděn 💔\n\n\
             Každý den to znova zkontroluju a jakmile bude všechno v pořádku, tak tohle issue zavřu.\n\n"
        ),
    };
    text.push_str(&render_table(locale, &profile.issues));
    text.push_str(&run_footer(locale, run_url));
    text
}

/// Posted on a report issue right before closing it.
pub fn fixed_comment(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "The shortcomings are fixed! 🎉",
        Locale::Cs => "Nedostatky jsou opravené! 🎉",
    }
}
