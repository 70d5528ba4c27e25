//! Login, registration and session commands.

#![allow(clippy::print_stdout)]

use std::process::ExitCode;

use ecomweb_storefront::Storefront;
use ecomweb_storefront::services::{Credentials, Registration};

use crate::render;

pub async fn login(storefront: &Storefront, username: &str, password: String) -> ExitCode {
    let credentials = Credentials::new(username, password);
    let outcome = storefront.login(&credentials).await;
    render::outcome(&outcome, render::user)
}

pub async fn register(storefront: &Storefront, registration: &Registration) -> ExitCode {
    let outcome = storefront.register(registration).await;
    render::outcome(&outcome, render::nothing)
}

pub async fn logout(storefront: &Storefront) -> ExitCode {
    let outcome = storefront.logout().await;
    render::outcome(&outcome, render::nothing)
}

pub async fn whoami(storefront: &Storefront) -> ExitCode {
    match storefront.current_user().await {
        Some(user) => {
            render::user(&user);
            render::cart(&storefront.cart().await);
            ExitCode::SUCCESS
        }
        None => {
            println!("Not signed in");
            ExitCode::FAILURE
        }
    }
}
