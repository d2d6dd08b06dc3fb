//! Print a bcrypt hash suitable for `ADMIN_PASSWORD_HASH`.

use bcrypt::{hash, DEFAULT_COST};
use std::env;

fn main() {
    let Some(password) = env::args().nth(1) else {
        eprintln!("Usage: hash-password <PASSWORD> [COST]");
        std::process::exit(1);
    };
    let cost = match env::args().nth(2) {
        Some(raw) => match raw.parse::<u32>() {
            Ok(cost) if (4..=31).contains(&cost) => cost,
            _ => {
                eprintln!("COST must be a number between 4 and 31");
                std::process::exit(1);
            }
        },
        None => DEFAULT_COST,
    };

    match hash(&password, cost) {
        Ok(hashed) => {
            println!("# bcrypt cost {}; add to .env:", cost);
            println!("ADMIN_PASSWORD_HASH={}", hashed);
        }
        Err(e) => {
            eprintln!("Error hashing password: {}", e);
            std::process::exit(1);
        }
    }
}
