use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};

pub struct Args {
    pub data_dir: String,
    pub command: Command,
}

pub enum Command {
    Preview {
        csv_file: String,
    },
    Import {
        csv_file: String,
        training: String,
        map_name: Option<String>,
        map_phone: Option<String>,
        map_email: Option<String>,
    },
    Export,
    AddStudent(StudentArgs),
    EditStudent {
        id: String,
        student: StudentArgs,
    },
    RemoveStudent {
        id: String,
    },
    AddTraining(TrainingArgs),
    EditTraining {
        id: String,
        training: TrainingArgs,
    },
    RemoveTraining {
        id: String,
    },
    Trainings,
    Report,
}

pub struct StudentArgs {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub training: String,
}

pub struct TrainingArgs {
    pub name: String,
    pub description: String,
    pub status: String,
    pub start_date: String,
    pub duration: String,
    pub instructor: String,
}

impl Args {
    pub fn parse() -> Self {
        let matches = Self::app().get_matches();
        Self::from_matches(&matches)
    }

    fn app<'a, 'b>() -> App<'a, 'b> {
        App::new("roster")
            .version("0.1.0")
            .about("student roster management: CSV import/export and record keeping")
            .setting(AppSettings::SubcommandRequiredElseHelp)
            .arg(
                Arg::with_name("data_dir")
                    .long("data-dir")
                    .takes_value(true)
                    .default_value("data")
                    .global(true)
                    .help("directory where roster collections are stored"),
            )
            .subcommand(
                SubCommand::with_name("preview")
                    .about("show detected columns, auto-mapping and row count of a CSV file")
                    .arg(csv_file_arg()),
            )
            .subcommand(
                SubCommand::with_name("import")
                    .about("bulk-import students from a CSV file")
                    .arg(csv_file_arg())
                    .arg(
                        Arg::with_name("training")
                            .long("training")
                            .takes_value(true)
                            .required(true)
                            .help("training the imported students belong to"),
                    )
                    .arg(
                        Arg::with_name("map_name")
                            .long("map-name")
                            .takes_value(true)
                            .help("column holding the student name, overriding auto-detection"),
                    )
                    .arg(
                        Arg::with_name("map_phone")
                            .long("map-phone")
                            .takes_value(true)
                            .help("column holding the student phone, overriding auto-detection"),
                    )
                    .arg(
                        Arg::with_name("map_email")
                            .long("map-email")
                            .takes_value(true)
                            .help("column holding the student email, overriding auto-detection"),
                    ),
            )
            .subcommand(
                SubCommand::with_name("export")
                    .about("write the student collection as CSV to stdout"),
            )
            .subcommand(student_args(
                SubCommand::with_name("add-student").about("add a single student"),
            ))
            .subcommand(
                student_args(
                    SubCommand::with_name("edit-student")
                        .about("overwrite a student's fields, keeping its id"),
                )
                .arg(id_arg("id of the student to edit")),
            )
            .subcommand(
                SubCommand::with_name("remove-student")
                    .about("delete a student")
                    .arg(id_arg("id of the student to remove")),
            )
            .subcommand(training_args(
                SubCommand::with_name("add-training").about("add a training"),
            ))
            .subcommand(
                training_args(
                    SubCommand::with_name("edit-training")
                        .about("overwrite a training's fields, keeping its id"),
                )
                .arg(id_arg("id of the training to edit")),
            )
            .subcommand(
                SubCommand::with_name("remove-training")
                    .about("delete a training")
                    .arg(id_arg("id of the training to remove")),
            )
            .subcommand(
                SubCommand::with_name("trainings").about("list the canonical training catalog"),
            )
            .subcommand(
                SubCommand::with_name("report")
                    .about("show per-training student counts and recent activity"),
            )
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        match matches.subcommand() {
            ("preview", Some(sub)) => Self::build(sub, Command::Preview {
                csv_file: value(sub, "csv_file"),
            }),
            ("import", Some(sub)) => Self::build(sub, Command::Import {
                csv_file: value(sub, "csv_file"),
                training: value(sub, "training"),
                map_name: optional(sub, "map_name"),
                map_phone: optional(sub, "map_phone"),
                map_email: optional(sub, "map_email"),
            }),
            ("export", Some(sub)) => Self::build(sub, Command::Export),
            ("add-student", Some(sub)) => {
                Self::build(sub, Command::AddStudent(StudentArgs::from_matches(sub)))
            }
            ("edit-student", Some(sub)) => Self::build(sub, Command::EditStudent {
                id: value(sub, "id"),
                student: StudentArgs::from_matches(sub),
            }),
            ("remove-student", Some(sub)) => Self::build(sub, Command::RemoveStudent {
                id: value(sub, "id"),
            }),
            ("add-training", Some(sub)) => {
                Self::build(sub, Command::AddTraining(TrainingArgs::from_matches(sub)))
            }
            ("edit-training", Some(sub)) => Self::build(sub, Command::EditTraining {
                id: value(sub, "id"),
                training: TrainingArgs::from_matches(sub),
            }),
            ("remove-training", Some(sub)) => Self::build(sub, Command::RemoveTraining {
                id: value(sub, "id"),
            }),
            ("trainings", Some(sub)) => Self::build(sub, Command::Trainings),
            ("report", Some(sub)) => Self::build(sub, Command::Report),
            _ => unreachable!("clap enforces a subcommand"),
        }
    }

    fn build(matches: &ArgMatches, command: Command) -> Self {
        Self {
            data_dir: value(matches, "data_dir"),
            command,
        }
    }
}

impl StudentArgs {
    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            name: value(matches, "name"),
            phone: value(matches, "phone"),
            email: value(matches, "email"),
            training: value(matches, "training"),
        }
    }
}

impl TrainingArgs {
    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            name: value(matches, "name"),
            description: value(matches, "description"),
            status: value(matches, "status"),
            start_date: value(matches, "start_date"),
            duration: value(matches, "duration"),
            instructor: value(matches, "instructor"),
        }
    }
}

fn csv_file_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name("csv_file")
        .takes_value(true)
        .required(true)
        .help("path of CSV file to read from")
}

fn id_arg(help: &'static str) -> Arg<'static, 'static> {
    Arg::with_name("id").takes_value(true).required(true).help(help)
}

fn student_args<'a, 'b>(cmd: App<'a, 'b>) -> App<'a, 'b> {
    cmd.arg(
        Arg::with_name("name")
            .long("name")
            .takes_value(true)
            .required(true)
            .help("student full name"),
    )
    .arg(
        Arg::with_name("phone")
            .long("phone")
            .takes_value(true)
            .required(true)
            .help("student phone number"),
    )
    .arg(
        Arg::with_name("email")
            .long("email")
            .takes_value(true)
            .required(true)
            .help("student email address"),
    )
    .arg(
        Arg::with_name("training")
            .long("training")
            .takes_value(true)
            .required(true)
            .help("training the student belongs to"),
    )
}

fn training_args<'a, 'b>(cmd: App<'a, 'b>) -> App<'a, 'b> {
    cmd.arg(
        Arg::with_name("name")
            .long("name")
            .takes_value(true)
            .required(true)
            .help("training name"),
    )
    .arg(
        Arg::with_name("description")
            .long("description")
            .takes_value(true)
            .default_value("")
            .help("short description"),
    )
    .arg(
        Arg::with_name("status")
            .long("status")
            .takes_value(true)
            .possible_values(&["active", "inactive", "planned"])
            .default_value("planned")
            .help("training status"),
    )
    .arg(
        Arg::with_name("start_date")
            .long("start-date")
            .takes_value(true)
            .default_value("")
            .help("start date, e.g. 2024-05-01"),
    )
    .arg(
        Arg::with_name("duration")
            .long("duration")
            .takes_value(true)
            .default_value("")
            .help("duration, e.g. '3 days'"),
    )
    .arg(
        Arg::with_name("instructor")
            .long("instructor")
            .takes_value(true)
            .default_value("")
            .help("instructor name"),
    )
}

fn value(matches: &ArgMatches, name: &str) -> String {
    matches.value_of(name).unwrap_or_default().to_string()
}

fn optional(matches: &ArgMatches, name: &str) -> Option<String> {
    matches.value_of(name).map(str::to_string)
}
