use crate::{ApproveArgs, CreateAdminArgs, MailArgs, RejectArgs};
use anyhow::Result;
use fletia::{
    access, approve_carrier, carriers, reject_carrier, HttpMailer, LogMailer, Mailer,
    SqliteProvider,
};
use tracing::info;

pub async fn handle_create_admin(db: &SqliteProvider, args: &CreateAdminArgs) -> Result<()> {
    let usuario = access::ensure_admin(&db.db, &args.email, &args.password, &args.nombre).await?;
    info!(uid = %usuario.uid, "Administrator ready");
    println!("✅ Administrator '{}' ({}) is ready.", usuario.email, usuario.uid);
    Ok(())
}

pub async fn handle_pending(db: &SqliteProvider) -> Result<()> {
    let pendientes = carriers::list_unverified(db).await?;
    if pendientes.is_empty() {
        println!("No carrier applications are waiting for review.");
        return Ok(());
    }

    println!("{} application(s) waiting for review:", pendientes.len());
    for t in pendientes {
        println!(
            "  {}  {} <{}>  [{}]  zona: {}  vehículo: {} {}  ({})",
            t.id,
            t.nombre,
            t.email,
            t.estado_verificacion,
            t.zona,
            t.vehiculo.tipo,
            t.vehiculo.placa,
            t.created_at.format("%Y-%m-%d %H:%M"),
        );
    }
    Ok(())
}

/// Picks the mail API when a URL is configured, otherwise logs the email.
pub fn build_mailer(args: &MailArgs) -> Result<Box<dyn Mailer>> {
    match args.mail_api_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => Ok(Box::new(HttpMailer::new(
            url.to_string(),
            args.mail_api_key.clone().filter(|k| !k.is_empty()),
            args.mail_from_address.clone(),
            args.mail_from_name.clone(),
        )?)),
        _ => Ok(Box::new(LogMailer)),
    }
}

pub async fn handle_approve(db: &SqliteProvider, args: &ApproveArgs) -> Result<()> {
    let mailer = build_mailer(&args.mail)?;
    let aprobacion = approve_carrier(db, mailer.as_ref(), &args.id).await?;
    println!("✅ {}", aprobacion.message);
    println!("   Account uid: {}", aprobacion.uid);
    if !aprobacion.email_sent {
        println!("⚠️  The credentials email could not be delivered. Check the logs.");
    }
    Ok(())
}

pub async fn handle_reject(db: &SqliteProvider, args: &RejectArgs) -> Result<()> {
    let message = reject_carrier(db, &args.id, args.motivo.as_deref()).await?;
    println!("✅ {message}");
    Ok(())
}
