// Terminal output of the oracles CLI

use chrono::{DateTime, Utc};
use colored::*;
use prettytable::{color, format, row, Attr, Cell, Row, Table};

use oracles_core::list::{EmptyReason, ListState, VotingListMachine};
use oracles_core::machine::{Notification, NotificationKind, Snapshot};
use oracles_core::utils::format_time_left;
use oracles_core::voting::{
    VoteOption, VotingDetail, VotingState, VotingStatus, VotingSummary,
};

fn status_color(status: VotingStatus) -> color::Color {
    match status {
        VotingStatus::Deploying | VotingStatus::Starting => color::YELLOW,
        VotingStatus::Pending | VotingStatus::Funding => color::CYAN,
        VotingStatus::Running => color::GREEN,
        VotingStatus::Voted => color::BLUE,
        VotingStatus::Counting => color::MAGENTA,
        VotingStatus::Archived => color::WHITE,
    }
}

pub fn status_badge(status: VotingStatus) -> ColoredString {
    let text = status.to_string();
    match status {
        VotingStatus::Deploying | VotingStatus::Starting => text.yellow(),
        VotingStatus::Pending | VotingStatus::Funding => text.cyan(),
        VotingStatus::Running => text.green().bold(),
        VotingStatus::Voted => text.blue(),
        VotingStatus::Counting => text.magenta(),
        VotingStatus::Archived => text.dimmed(),
    }
}

fn status_cell(status: VotingStatus) -> Cell {
    Cell::new(&status.to_string()).with_style(Attr::ForegroundColor(status_color(status)))
}

pub fn voting_table(votings: &[VotingSummary], now: DateTime<Utc>) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    table.set_titles(row!["ID", "Title", "Status", "Prize pool", "Votes", "Deadline"]);

    for voting in votings {
        table.add_row(Row::new(vec![
            Cell::new(voting.id.as_str()),
            Cell::new(&voting.title),
            status_cell(voting.status),
            Cell::new(&format!("{:.2}", voting.funding_amount)),
            Cell::new(&voting.votes_count.to_string()),
            Cell::new(&format_time_left(voting.finish_date, now)),
        ]));
    }
    table
}

pub fn print_list(snapshot: &Snapshot<VotingListMachine>, now: DateTime<Utc>) {
    let context = &snapshot.context;
    println!(
        "{} {} ({})",
        "Votings".bold(),
        context.segment.to_string().cyan(),
        snapshot.state
    );

    if snapshot.state == ListState::Failure {
        if let Some(message) = &context.error_message {
            println!("{}", message.red());
        }
    }

    match snapshot.empty_reason() {
        Some(EmptyReason::NoVotingsYet) => println!("{}", "There are no votings yet".dimmed()),
        Some(EmptyReason::NoVotingsForYou) => {
            println!("{}", "There are no votings for you".dimmed())
        }
        None => {
            if !context.votings.is_empty() {
                voting_table(&context.votings, now).printstd();
            }
        }
    }

    if snapshot.can_load_more() {
        println!("{}", "More votings available, pass --all to load every page".dimmed());
    }
}

pub fn print_detail(detail: &VotingDetail, state: Option<&VotingState>, now: DateTime<Utc>) {
    println!("{} {}", detail.title.bold(), status_badge(detail.status));
    println!("  id:         {}", detail.id);
    println!("  issuer:     {}", detail.issuer);
    if let Some(hash) = &detail.contract_hash {
        println!("  contract:   {}", hash);
    }
    if !detail.description.is_empty() {
        println!("  {}", detail.description);
    }
    println!("  balance:    {:.2}", detail.balance);
    println!("  prize pool: {:.2}", detail.funding_amount);
    println!("  deadline:   {}", format_time_left(detail.finish_date, now));
    if let Some(state) = state {
        println!("  state:      {}", state);
    }

    let show_results = match state {
        Some(state) => state.shows_results(),
        None => matches!(
            detail.status,
            VotingStatus::Voted | VotingStatus::Counting | VotingStatus::Archived
        ),
    };
    if show_results {
        let results = &detail.results;
        println!(
            "  results:    {} {:.1}% / {} {:.1}% ({} votes)",
            VoteOption::Confirm,
            results.percentage(VoteOption::Confirm),
            VoteOption::Reject,
            results.percentage(VoteOption::Reject),
            detail.votes_count
        );
    } else {
        println!("  votes:      {}", detail.votes_count);
    }
}

pub fn print_notification(notification: &Notification) {
    match &notification.kind {
        NotificationKind::Error(_) => eprintln!("{} {}", "error:".red().bold(), notification),
        NotificationKind::Confirmed(_) => println!("{} {}", "ok:".green().bold(), notification),
    }
}
