mod auth;
mod db;
pub mod numerals;
mod programs;
mod songs;
mod users;
mod validation;

pub use auth::*;
pub use db::*;
pub use programs::*;
pub use songs::*;
pub use users::*;
pub use validation::{Field, RequiredFields, ValidationError, PROGRAM_FIELDS, SPECIAL_FIELDS};

/// Options that shape how the cue sheet system behaves
#[derive(Debug, Clone)]
pub struct CuesheetOptions {
    pub scope: Scope,
    pub tokens: TokenSettings,
    pub throttle: ThrottleSettings,
}

/// The cue sheet system, tying together accounts, users, and both
/// program collections over a single database.
pub struct Cuesheet {
    pub auth: Auth,
    pub users: UserManager,
    pub programs: ProgramManager,
    pub specials: SpecialManager,
}

impl Cuesheet {
    pub fn new(database: SharedDatabase, options: CuesheetOptions) -> Self {
        Self {
            auth: Auth::new(&database, &options.tokens, options.throttle),
            users: UserManager::new(&database),
            programs: ProgramManager::new(&database, options.scope),
            specials: SpecialManager::new(&database, options.scope),
        }
    }
}
