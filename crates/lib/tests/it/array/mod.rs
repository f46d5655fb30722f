mod focus;
mod mutations;
mod validation;
