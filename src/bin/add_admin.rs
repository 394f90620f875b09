use clap::Parser;
use klub::{
    config::Settings,
    connect_database,
    domain::{default_membership_type, CreateMemberRequest, MemberStatus},
    service::ServiceContext,
};

/// Create the first admin account, or promote an existing member to admin.
///
/// The new account's password is its email address.
#[derive(Debug, Parser)]
#[command(name = "add-admin")]
struct Args {
    /// Admin email address (also the initial password)
    #[arg(long)]
    email: String,

    #[arg(long, default_value = "Admin")]
    first_name: String,

    #[arg(long, default_value = "User")]
    surname: String,

    #[arg(long, default_value = "M0001")]
    member_number: String,

    #[arg(long, default_value = "2027-12-31")]
    expiry_date: String,

    /// Overrides database.url from configuration (falls back to DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    if !args.email.contains('@') {
        anyhow::bail!("Invalid email address: {}", args.email);
    }

    let mut settings = Settings::new().unwrap_or_default();
    if let Some(url) = args.database_url.or_else(|| std::env::var("DATABASE_URL").ok()) {
        settings.database.url = url;
    }

    println!("📋 Opening {} ...", settings.database.url);
    let db_pool = connect_database(&settings.database).await?;
    let services = ServiceContext::new(db_pool, &settings);

    let request = CreateMemberRequest {
        member_number: args.member_number,
        first_name: args.first_name,
        surname: args.surname,
        email: args.email,
        phone: None,
        membership_type: default_membership_type(),
        expiry_date: args.expiry_date,
        status: MemberStatus::Active,
        photo_url: None,
        is_admin: true,
        password: None,
        dependents: Vec::new(),
    };

    let (admin, created) = services.member_service.ensure_admin(request).await?;

    if created {
        println!("✅ Admin created");
        println!("   Email:    {}", admin.email);
        println!("   Password: {}", admin.email);
    } else {
        println!("✅ {} is an admin", admin.email);
    }

    Ok(())
}
