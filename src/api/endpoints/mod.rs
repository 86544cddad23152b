mod identify;
mod plants;
mod progress;
mod users;
