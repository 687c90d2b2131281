//! Account commands.

use botdesk_models::{LoginCredentials, RegisterData, User};

use super::{mask, Context, Result};
use crate::output;

pub async fn cmd_login(ctx: &Context, email: String, password: String) -> Result<()> {
    let auth = ctx.client.auth();
    auth.login(&LoginCredentials { email, password }).await?;
    let user = auth.current_user().await?;
    report_session(ctx, "Logged in", &user)
}

pub async fn cmd_register(
    ctx: &Context,
    email: String,
    full_name: String,
    password: String,
) -> Result<()> {
    let response = ctx
        .client
        .auth()
        .register(&RegisterData {
            email,
            password,
            full_name,
        })
        .await?;

    match (response.tokens.is_some(), response.user) {
        (true, Some(user)) => report_session(ctx, "Registered", &user),
        (_, user) => {
            if let Some(user) = user.as_ref() {
                output::emit(ctx.format, user, |_| {})?;
            }
            if !response.message.is_empty() {
                println!("{}", response.message);
            }
            println!("Check your inbox, then run `botdesk verify-email <token>`.");
            Ok(())
        }
    }
}

pub async fn cmd_verify_email(ctx: &Context, token: &str) -> Result<()> {
    let response = ctx.client.auth().verify_email(token).await?;
    let user = match response.user {
        Some(user) => user,
        None => ctx.client.auth().current_user().await?,
    };
    report_session(ctx, "Email verified", &user)
}

pub async fn cmd_google_auth(ctx: &Context, code: &str) -> Result<()> {
    let response = ctx.client.auth().google_auth(code).await?;
    let user = match response.user {
        Some(user) => user,
        None => ctx.client.auth().current_user().await?,
    };
    report_session(ctx, "Logged in with Google", &user)
}

pub async fn cmd_whoami(ctx: &Context) -> Result<()> {
    if !ctx.client.session().is_authenticated()? {
        println!("Not logged in. Run `botdesk login <email>`.");
        return Ok(());
    }

    let user = ctx.client.auth().current_user().await?;
    output::emit(ctx.format, &user, |user| {
        output::print_user(user);
        if let Ok(Some(token)) = ctx.client.session().access_token() {
            println!("  Access token: {}", mask(&token));
        }
    })
}

pub fn cmd_logout(ctx: &Context) -> Result<()> {
    ctx.client.auth().logout()?;
    println!("Logged out.");
    Ok(())
}

fn report_session(ctx: &Context, action: &str, user: &User) -> Result<()> {
    output::emit(ctx.format, user, |user| {
        println!("{} as {} <{}>", action, user.full_name, user.email);
    })
}
