mod amount;
mod cli;
mod db;
mod error;
mod fmt;
mod form;
mod logging;
mod models;
mod reports;
mod settings;
mod store;
mod tui;

use clap::Parser;

use cli::{
    AreasCommands, Cli, Commands, ConfigCommands, CoprasCommands, ExportCommands,
    FishpondCommands, LogCommands, RentalCommands, TenantsCommands,
};

fn main() {
    let cli = Cli::parse();

    logging::init(&settings::get_data_dir());

    let Some(command) = cli.command else {
        if let Err(e) = cli::dashboard::run() {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
        return;
    };

    let result = match command {
        Commands::Init { data_dir, owner } => cli::init::run(data_dir, owner),
        Commands::Areas { command } => match command {
            AreasCommands::Add { name, cycle_months } => cli::areas::add(&name, cycle_months),
            AreasCommands::List => cli::areas::list(),
            AreasCommands::Harvest { area, date } => cli::areas::harvest(&area, date.as_deref()),
            AreasCommands::History { area } => cli::areas::history(area.as_deref()),
            AreasCommands::Schedule => cli::areas::schedule(),
            AreasCommands::Delete { id } => cli::areas::delete(id),
        },
        Commands::Copras { command } => match command {
            CoprasCommands::Add {
                area,
                farmer,
                date,
                sales,
                expenses,
                weight,
            } => cli::copras::add(&cli::copras::CoprasArgs {
                area: Some(area),
                farmer: Some(farmer),
                date,
                sales: Some(sales),
                expenses: Some(expenses),
                weight: Some(weight),
            }),
            CoprasCommands::Edit {
                id,
                area,
                farmer,
                date,
                sales,
                expenses,
                weight,
            } => cli::copras::edit(
                id,
                &cli::copras::CoprasArgs {
                    area,
                    farmer,
                    date,
                    sales,
                    expenses,
                    weight,
                },
            ),
            CoprasCommands::Delete { id } => cli::copras::delete(id),
            CoprasCommands::List { area } => cli::copras::list(area.as_deref()),
            CoprasCommands::Summary => cli::copras::summary(),
        },
        Commands::Fishpond { command } => match command {
            FishpondCommands::Start { date } => cli::fishpond::start(date.as_deref()),
            FishpondCommands::Expense {
                id,
                name,
                amount,
                date,
            } => cli::fishpond::expense(id, &name, &amount, date.as_deref()),
            FishpondCommands::Sale {
                id,
                fish_type,
                kilos,
                price,
                date,
            } => cli::fishpond::sale(id, &fish_type, &kilos, &price, date.as_deref()),
            FishpondCommands::Complete { id, date } => cli::fishpond::complete(id, date.as_deref()),
            FishpondCommands::Delete { id } => cli::fishpond::delete(id),
            FishpondCommands::List => cli::fishpond::list(),
            FishpondCommands::Show { id } => cli::fishpond::show(id),
        },
        Commands::Tenants { command } => match command {
            TenantsCommands::Add { name, tax } => cli::tenants::add(&name, &tax),
            TenantsCommands::List => cli::tenants::list(),
            TenantsCommands::Delete { id } => cli::tenants::delete(id),
        },
        Commands::Rental { command } => match command {
            RentalCommands::Collect {
                month,
                year,
                paid,
                exempt,
            } => cli::rental::collect(month, year, &paid, &exempt),
            RentalCommands::Status { id, status } => cli::rental::set_status(id, &status),
            RentalCommands::List { year, transaction } => cli::rental::list(year, transaction),
        },
        Commands::Log { command } => match command {
            LogCommands::Add { action } => cli::logs::add(&action),
            LogCommands::List => cli::logs::list(),
            LogCommands::Delete { id } => cli::logs::delete(id),
        },
        Commands::Export { command } => match command {
            ExportCommands::Copras { output } => cli::export::copras(output).map(|_| ()),
            ExportCommands::Rental { output } => cli::export::rental(output).map(|_| ()),
            ExportCommands::Fishpond { output } => cli::export::fishpond(output).map(|_| ()),
        },
        Commands::Config { command } => match command {
            ConfigCommands::Show => cli::config::show(),
            ConfigCommands::SetSplit { split } => cli::config::set_split(&split),
            ConfigCommands::SetOffset { months } => cli::config::set_offset(months),
            ConfigCommands::SetOwner { name } => cli::config::set_owner(&name),
        },
        Commands::Demo => cli::demo::run(),
        Commands::Load { path } => cli::load::run(&path),
        Commands::Backup { output } => cli::backup::run(output),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
