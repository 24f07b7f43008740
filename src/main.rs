use clap::Parser;
use heirvault::cli::{Cli, Commands, KitAction, PlanAction, TrusteeAction};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => heirvault::cli::commands::init::execute(&cli),
        Commands::Set {
            ref name,
            ref value,
            ref from_file,
        } => heirvault::cli::commands::set::execute(
            &cli,
            name,
            value.as_deref(),
            from_file.as_deref(),
        ),
        Commands::Get { ref name } => heirvault::cli::commands::get::execute(&cli, name),
        Commands::List => heirvault::cli::commands::list::execute(&cli),
        Commands::Delete { ref name, force } => {
            heirvault::cli::commands::delete::execute(&cli, name, force)
        }
        Commands::RotateKey => heirvault::cli::commands::rotate::execute(&cli),
        Commands::Plan { ref action } => run_plan(&cli, action),
        Commands::Trustee { ref action } => run_trustee(&cli, action),
        Commands::Kit { ref action } => run_kit(&cli, action),
        Commands::Audit { last, ref since } => {
            heirvault::cli::commands::audit_cmd::execute(&cli, last, since.as_deref())
        }
        Commands::Completions { ref shell } => {
            heirvault::cli::commands::completions::execute(shell)
        }
        Commands::Version => heirvault::cli::commands::version::execute(),
    };

    if let Err(e) = result {
        heirvault::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}

fn run_plan(cli: &Cli, action: &PlanAction) -> heirvault::errors::Result<()> {
    match action {
        PlanAction::Create {
            name,
            threshold,
            waiting_days,
            trustees,
            beneficiaries,
            items,
        } => heirvault::cli::commands::plan::execute_create(
            cli,
            name,
            *threshold,
            *waiting_days,
            trustees,
            beneficiaries,
            items,
        ),
        PlanAction::List => heirvault::cli::commands::plan::execute_list(cli),
        PlanAction::Status { plan_id } => {
            heirvault::cli::commands::plan::execute_status(cli, plan_id)
        }
        PlanAction::Approve {
            plan_id,
            trustee_email,
        } => heirvault::cli::commands::plan::execute_approve(cli, plan_id, trustee_email),
        PlanAction::Trigger {
            plan_id,
            reason,
            emergency_override,
        } => heirvault::cli::commands::plan::execute_trigger(
            cli,
            plan_id,
            reason,
            *emergency_override,
        ),
        PlanAction::Cancel { plan_id } => {
            heirvault::cli::commands::plan::execute_cancel(cli, plan_id)
        }
        PlanAction::Complete { plan_id } => {
            heirvault::cli::commands::plan::execute_complete(cli, plan_id)
        }
        PlanAction::Edit {
            plan_id,
            threshold,
            trustees,
        } => heirvault::cli::commands::plan::execute_edit(cli, plan_id, *threshold, trustees),
        PlanAction::Delete { plan_id, force } => {
            heirvault::cli::commands::plan::execute_delete(cli, plan_id, *force)
        }
        PlanAction::Shares {
            plan_id,
            output_dir,
        } => heirvault::cli::commands::plan::execute_shares(cli, plan_id, output_dir),
        PlanAction::Reconstruct {
            plan_id,
            shares,
            output_dir,
        } => heirvault::cli::commands::plan::execute_reconstruct(cli, plan_id, shares, output_dir),
    }
}

fn run_trustee(cli: &Cli, action: &TrusteeAction) -> heirvault::errors::Result<()> {
    match action {
        TrusteeAction::Keygen { out } => {
            heirvault::cli::commands::trustee::execute_keygen(cli, out)
        }
        TrusteeAction::DecryptShare {
            share_file,
            key,
            out,
        } => heirvault::cli::commands::trustee::execute_decrypt_share(cli, share_file, key, out),
    }
}

fn run_kit(cli: &Cli, action: &KitAction) -> heirvault::errors::Result<()> {
    match action {
        KitAction::Generate {
            email,
            total,
            threshold,
            out,
        } => heirvault::cli::commands::kit::execute_generate(cli, email, *total, *threshold, out),
        KitAction::Restore {
            kit_file,
            share_indices,
            new_passphrase,
        } => heirvault::cli::commands::kit::execute_restore(
            cli,
            kit_file,
            share_indices,
            *new_passphrase,
        ),
    }
}
