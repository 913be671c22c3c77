use std::{error::Error, io, path::Path, process::exit};

use bcrypt::DEFAULT_COST;
use clap::Parser;
use rusqlite::Connection;

use treasurer_tools::{
    PasswordHash, UserID, ValidatedPassword, get_user_by_id, initialize_db, upsert_user,
};

/// Set the treasurer's log in password, creating the account if needed.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "DATABASE_PATH")]
    db_path: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let db_path = Path::new(&args.db_path);
    validate_db_path(db_path);

    let connection = Connection::open(db_path)?;
    initialize_db(&connection)?;

    match get_user_by_id(UserID::TREASURER, &connection) {
        Ok(_) => println!("Resetting the treasurer's password in {db_path:#?}"),
        Err(treasurer_tools::Error::NotFound) => {
            println!("Setting the treasurer's password in {db_path:#?}")
        }
        Err(error) => return Err(error.into()),
    }

    let Some(password_hash) = get_new_password_hash() else {
        return Ok(());
    };

    upsert_user(UserID::TREASURER, password_hash, &connection)?;
    println!("Password updated successfully!");

    Ok(())
}

fn validate_db_path(db_path: &Path) {
    let has_extension = db_path
        .extension()
        .is_some_and(|extension| !extension.is_empty());

    if !has_extension {
        print_error("Database path must include a file extension (e.g., 'treasurer.db').");
        exit(1);
    }
}

fn prompt(message: &str) -> Option<String> {
    match rpassword::prompt_password(message) {
        Ok(string) => Some(string),
        Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => None,
        Err(error) => {
            print_error(format!("Could not read password from stdin: {error}"));
            None
        }
    }
}

fn get_new_password_hash() -> Option<PasswordHash> {
    loop {
        println!();

        let first_password = prompt("Enter a new password: ")?;

        if let Err(error) = ValidatedPassword::new(&first_password) {
            print_error(error);
            continue;
        }

        let second_password = prompt("Enter the same password again: ")?;

        if first_password != second_password {
            print_error("Passwords must match, try again.");
            continue;
        }

        match PasswordHash::from_raw_password(&first_password, DEFAULT_COST) {
            Ok(password_hash) => return Some(password_hash),
            Err(error) => print_error(format!("Could not hash password: {error}. Try again.")),
        }
    }
}

fn print_error(error: impl ToString) {
    eprintln!(
        "\x1b[31;1m{}\x1b[0m",
        capitalise_first_char(&error.to_string())
    )
}

fn capitalise_first_char(string: &str) -> String {
    let mut chars = string.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    first.to_uppercase().chain(chars).collect()
}
