use std::error::Error;
use std::path::Path;
use std::process;

use student_roster::args::{Args, Command, TrainingArgs};
use student_roster::import::{self, ColumnMapping, CsvPreview};
use student_roster::roster::{Roster, TrainingDetails, TrainingStatus, TRAINING_OPTIONS};
use student_roster::store::JsonStore;

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(err) = run(args) {
        eprintln!("{}", err);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let store = JsonStore::open(&args.data_dir)?;

    match args.command {
        Command::Preview { csv_file } => preview(&csv_file),
        Command::Import {
            csv_file,
            training,
            map_name,
            map_phone,
            map_email,
        } => run_import(&store, &csv_file, &training, map_name, map_phone, map_email),
        Command::Export => {
            let roster = Roster::load_from(&store)?;
            print!("{}", roster.export_csv()?);
            Ok(())
        }
        Command::AddStudent(student) => {
            let mut roster = Roster::load_from(&store)?;
            let added = roster.add_student(
                &store,
                &student.name,
                &student.phone,
                &student.email,
                &student.training,
            )?;
            println!("added student {} ({})", added.name, added.id);
            Ok(())
        }
        Command::EditStudent { id, student } => {
            let mut roster = Roster::load_from(&store)?;
            let updated = roster.edit_student(
                &store,
                &id,
                &student.name,
                &student.phone,
                &student.email,
                &student.training,
            )?;
            println!("updated student {} ({})", updated.name, updated.id);
            Ok(())
        }
        Command::RemoveStudent { id } => {
            let mut roster = Roster::load_from(&store)?;
            let removed = roster.remove_student(&store, &id)?;
            println!("removed student {}", removed.name);
            Ok(())
        }
        Command::AddTraining(training) => {
            let mut roster = Roster::load_from(&store)?;
            let added = roster.add_training(&store, details_from(training))?;
            println!("added training {} ({})", added.name, added.id);
            Ok(())
        }
        Command::EditTraining { id, training } => {
            let mut roster = Roster::load_from(&store)?;
            let updated = roster.edit_training(&store, &id, details_from(training))?;
            println!("updated training {} ({})", updated.name, updated.id);
            Ok(())
        }
        Command::RemoveTraining { id } => {
            let mut roster = Roster::load_from(&store)?;
            let removed = roster.remove_training(&store, &id)?;
            println!("removed training {}", removed.name);
            Ok(())
        }
        Command::Trainings => {
            for name in TRAINING_OPTIONS.iter() {
                println!("{}", name);
            }
            Ok(())
        }
        Command::Report => report(&store),
    }
}

fn preview(csv_file: &str) -> Result<(), Box<dyn Error>> {
    let text = import::read_import_file(Path::new(csv_file))?;
    let preview = CsvPreview::parse(&text)?;
    let mapping = ColumnMapping::detect(&preview.headers);

    println!("columns: {}", preview.headers.join(", "));
    println!("detected mapping:");
    print_mapping("name", &mapping.name);
    print_mapping("phone", &mapping.phone);
    print_mapping("email", &mapping.email);
    println!("first rows:");
    for row in &preview.rows {
        println!("  {}", row.join(" | "));
    }
    println!("{} data rows", preview.row_count);

    Ok(())
}

fn print_mapping(field: &str, column: &Option<String>) {
    match column {
        Some(column) => println!("  {:<5} -> {}", field, column),
        None => println!("  {:<5} -> (unmapped)", field),
    }
}

fn run_import(
    store: &JsonStore,
    csv_file: &str,
    training: &str,
    map_name: Option<String>,
    map_phone: Option<String>,
    map_email: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let text = import::read_import_file(Path::new(csv_file))?;
    let mut roster = Roster::load_from(store)?;

    // Overrides are applied on top of the auto-detected mapping; with no
    // overrides the engine detects on its own.
    let mapping = if map_name.is_some() || map_phone.is_some() || map_email.is_some() {
        import::split_lines(&text).first().map(|header| {
            ColumnMapping::detect(&import::tokenize_line(header))
                .override_with(map_name, map_phone, map_email)
        })
    } else {
        None
    };

    let summary = roster.import_csv(store, &text, mapping, training)?;
    println!(
        "imported {} students into {}",
        summary.imported, summary.training
    );
    if !summary.errors().is_empty() {
        println!("{} rows skipped:", summary.errors().len());
        for error in summary.displayed_errors() {
            println!("  {}", error);
        }
        if summary.hidden_error_count() > 0 {
            println!("  ... and {} more", summary.hidden_error_count());
        }
    }

    Ok(())
}

fn report(store: &JsonStore) -> Result<(), Box<dyn Error>> {
    let mut roster = Roster::load_from(store)?;
    roster.refresh_training_counts(store)?;

    println!("{} students", roster.students().len());
    for training in roster.trainings() {
        println!("  {}: {} students", training.name, training.students);
    }

    if !roster.activities().is_empty() {
        println!("recent activity:");
        for activity in roster.activities().iter().take(5) {
            println!(
                "  {} {}",
                activity.timestamp.format("%Y-%m-%d %H:%M"),
                activity.message
            );
        }
    }

    Ok(())
}

fn details_from(args: TrainingArgs) -> TrainingDetails {
    TrainingDetails {
        name: args.name,
        description: args.description,
        status: TrainingStatus::from_arg(&args.status).unwrap_or(TrainingStatus::Planned),
        start_date: args.start_date,
        duration: args.duration,
        instructor: args.instructor,
    }
}
