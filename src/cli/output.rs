//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use chrono::Utc;
use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::plan::{InheritancePlan, PlanStatusReport};
use crate::vault::VaultItemMetadata;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print a table of vault item metadata (Name, Id, Created, Updated).
pub fn print_items_table(items: &[VaultItemMetadata]) {
    if items.is_empty() {
        info("No items in this vault yet.");
        tip("Run `heirvault set <NAME>` to add your first item.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Id", "Created", "Updated"]);

    for item in items {
        table.add_row(vec![
            item.name.clone(),
            item.id.clone(),
            item.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            item.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }

    println!("{table}");
}

/// Print a table of inheritance plans.
pub fn print_plans_table(plans: &[InheritancePlan]) {
    if plans.is_empty() {
        info("No inheritance plans yet.");
        tip("Run `heirvault plan create` to set one up.");
        return;
    }

    let now = Utc::now();
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Id", "Name", "Status", "Approvals", "Created"]);

    for plan in plans {
        table.add_row(vec![
            plan.id.clone(),
            plan.name.clone(),
            plan.status.to_string(),
            format!(
                "{}/{} (need {})",
                plan.approved_count(),
                plan.trustees.len(),
                plan.k_threshold
            ),
            plan.created_at.format("%Y-%m-%d").to_string(),
        ]);
    }

    println!("{table}");

    for plan in plans {
        if plan.can_trigger(now) {
            info(&format!(
                "Plan '{}' has met its quorum and waiting period — it can be triggered.",
                plan.name
            ));
        }
    }
}

/// Print a full status report for one plan.
pub fn print_plan_status(report: &PlanStatusReport) {
    let plan = &report.plan;
    let progress = &report.progress;

    println!("{}", style(&plan.name).bold());
    println!("  id:             {}", plan.id);
    println!("  status:         {}", plan.status);
    println!(
        "  threshold:      {} of {} trustees",
        plan.k_threshold, plan.n_total
    );
    println!("  waiting period: {} days", plan.waiting_period_days);
    println!(
        "  created:        {}",
        plan.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!(
        "  trigger after:  {}",
        plan.trigger_available_at().format("%Y-%m-%d %H:%M:%S")
    );
    if let Some(triggered_at) = plan.triggered_at {
        println!(
            "  triggered:      {}",
            triggered_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    if let Some(ref reason) = plan.trigger_reason {
        println!("  reason:         {reason}");
    }
    println!(
        "  approvals:      {}/{} (can trigger: {})",
        progress.approved,
        progress.total,
        if progress.can_trigger { "yes" } else { "no" }
    );
    println!("  items:          {}", plan.item_ids.len());

    let mut trustees = Table::new();
    trustees.set_content_arrangement(ContentArrangement::Dynamic);
    trustees.set_header(vec!["Trustee", "Email", "Share", "Approved"]);
    for t in &plan.trustees {
        trustees.add_row(vec![
            t.name.clone(),
            t.email.clone(),
            format!("#{}", t.share_index),
            match t.approved_at {
                Some(at) => at.format("%Y-%m-%d %H:%M").to_string(),
                None => "-".to_string(),
            },
        ]);
    }
    println!("{trustees}");

    if !plan.beneficiaries.is_empty() {
        let mut beneficiaries = Table::new();
        beneficiaries.set_content_arrangement(ContentArrangement::Dynamic);
        beneficiaries.set_header(vec!["Beneficiary", "Email", "Relationship"]);
        for b in &plan.beneficiaries {
            beneficiaries.add_row(vec![b.name.clone(), b.email.clone(), b.relationship.clone()]);
        }
        println!("{beneficiaries}");
    }
}
