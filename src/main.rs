//! car-ads terminal client
//!
//! One subcommand per user action, routed the same way the browser page was:
//! the view controller opens the matching panel (refusing panels the current
//! session may not see), the resource client talks to the backend, and the
//! renderer turns records into fragments printed below. Session state lives
//! in a dotfile, so login survives across invocations.
//!
//! Usage:
//!   cargo run --bin car-ads -- login -m 5551234 -p secret
//!   cargo run --bin car-ads -- ads
//!   cargo run --bin car-ads -- search --brand Toyota --min-price 1000

use clap::{Parser, Subcommand};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use car_ads_client::client::ApiClient;
use car_ads_client::models::{
    AdvertisementUpdate, NewAdvertisement, NewCar, SearchFilters, TransactionStatus,
};
use car_ads_client::policy::{visible_panels, Action};
use car_ads_client::render::{
    render_advertisements, render_cars, render_transactions, render_users, Fragment,
};
use car_ads_client::session::{FileSessionStore, SessionStore};
use car_ads_client::view::{NoticeKind, Section, ViewController};

const DEFAULT_URL: &str = "http://127.0.0.1:5000";

#[derive(Parser)]
#[command(name = "car-ads")]
#[command(about = "Terminal client for the car-ads marketplace", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend base URL (falls back to CAR_ADS_API_URL, then localhost:5000)
    #[arg(short, long)]
    url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Register {
        #[arg(short, long)]
        mobile: String,
        #[arg(short, long)]
        password: String,
    },
    /// Log in and persist the session
    Login {
        #[arg(short, long)]
        mobile: String,
        #[arg(short, long)]
        password: String,
    },
    Logout,
    /// Show who is logged in and which panels are available
    Panels,
    /// List all advertisements
    Ads,
    /// Show a single advertisement
    Ad { id: i64 },
    /// Publish a new advertisement
    CreateAd {
        #[arg(long)]
        make: String,
        #[arg(long)]
        model: String,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        color: String,
        #[arg(long, default_value = "used")]
        status: String,
        #[arg(short, long)]
        title: String,
        #[arg(short, long)]
        description: String,
        #[arg(short, long)]
        price: f64,
    },
    /// Edit fields of an existing advertisement
    EditAd {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        status: Option<String>,
    },
    DeleteAd { id: i64 },
    /// Advanced car search
    Search {
        #[arg(long)]
        min_price: Option<f64>,
        #[arg(long)]
        max_price: Option<f64>,
        #[arg(long)]
        brand: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },
    /// List every car known to the backend
    Cars,
    /// Cars related to the given one (same make)
    Related { car_id: i64 },
    /// User management listing (admin tier)
    Users,
    /// Deactivate a user account (admin tier)
    Deactivate { user_id: i64 },
    /// Transactions visible to the current user
    Transactions,
    /// Propose to buy the car behind an advertisement
    Buy {
        car_id: i64,
        #[arg(short, long)]
        price: f64,
    },
    /// Propose a transaction status change (accepted/rejected/completed)
    TxStatus { id: i64, status: String },
}

fn action_label(action: Action) -> &'static str {
    match action {
        Action::Edit => "edit",
        Action::Delete => "delete",
        Action::BuyNow => "buy-now",
        Action::Accept => "accept",
        Action::Reject => "reject",
        Action::MarkCompleted => "mark-completed",
        Action::Deactivate => "deactivate",
    }
}

fn print_fragments(fragments: &[Fragment]) {
    for fragment in fragments {
        match fragment.id {
            Some(id) => println!("── {} (#{})", fragment.title, id),
            None => println!("── {}", fragment.title),
        }
        for line in &fragment.lines {
            println!("   {}", line);
        }
        if !fragment.actions.is_empty() {
            let labels: Vec<&str> =
                fragment.actions.iter().map(|a| action_label(*a)).collect();
            println!("   actions: [{}]", labels.join("] ["));
        }
    }
}

/// Post the notice on the controller (5s window, as in the page) and echo it
fn notify(view: &mut ViewController, text: &str, kind: NoticeKind) {
    view.post_notice(text, kind);
    if let Some(notice) = view.notice(Instant::now()) {
        match notice.kind {
            NoticeKind::Success => println!("✅ {}", notice.text),
            NoticeKind::Error => println!("⚠️  {}", notice.text),
        }
    }
}

/// Open the panel for this action; on refusal post the error and bail out
fn open_panel<S: SessionStore>(
    view: &mut ViewController,
    section: Section,
    client: &ApiClient<S>,
) -> bool {
    match view.show(section, &client.session()) {
        Ok(()) => true,
        Err(e) => {
            notify(view, &e.to_string(), NoticeKind::Error);
            false
        }
    }
}

async fn refresh_listing<S: SessionStore>(view: &mut ViewController, client: &ApiClient<S>) {
    view.return_to_listing();
    match client.list_advertisements().await {
        Ok(ads) => print_fragments(&render_advertisements(&ads, &client.session())),
        Err(e) => notify(view, &e.to_string(), NoticeKind::Error),
    }
}

/// Delete flow: reports the outcome and says whether the listing should be
/// re-fetched. A failed delete leaves the current listing untouched.
async fn delete_ad<S: SessionStore>(
    view: &mut ViewController,
    client: &ApiClient<S>,
    id: i64,
) -> bool {
    match client.delete_advertisement(id).await {
        Ok(()) => {
            notify(
                view,
                "Advertisement deleted successfully.",
                NoticeKind::Success,
            );
            true
        }
        Err(e) => {
            notify(view, &e.to_string(), NoticeKind::Error);
            false
        }
    }
}

fn parse_status(raw: &str) -> Option<TransactionStatus> {
    match raw {
        "accepted" => Some(TransactionStatus::Accepted),
        "rejected" => Some(TransactionStatus::Rejected),
        "completed" => Some(TransactionStatus::Completed),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let url = cli
        .url
        .or_else(|| std::env::var("CAR_ADS_API_URL").ok())
        .unwrap_or_else(|| DEFAULT_URL.to_string());

    let store = FileSessionStore::default_location();
    let client = ApiClient::new(url, store)?;
    let mut view = ViewController::new();

    match cli.command {
        Commands::Register { mobile, password } => {
            if open_panel(&mut view, Section::Register, &client) {
                match client.register(&mobile, &password).await {
                    Ok(res) => {
                        notify(&mut view, &res.message, NoticeKind::Success);
                        println!("You can now log in: car-ads login -m {} -p <password>", mobile);
                    }
                    Err(e) => notify(&mut view, &e.to_string(), NoticeKind::Error),
                }
            }
        }
        Commands::Login { mobile, password } => {
            if open_panel(&mut view, Section::Login, &client) {
                match client.login(&mobile, &password).await {
                    Ok(outcome) => {
                        notify(&mut view, &outcome.message, NoticeKind::Success);
                        // Back to the listing with the new session's controls
                        refresh_listing(&mut view, &client).await;
                    }
                    Err(e) => notify(&mut view, &e.to_string(), NoticeKind::Error),
                }
            }
        }
        Commands::Logout => match client.logout().await {
            Ok(message) => notify(&mut view, &message, NoticeKind::Success),
            Err(e) => notify(&mut view, &e.to_string(), NoticeKind::Error),
        },
        Commands::Panels => {
            let session = client.session();
            match &session.user_mobile {
                Some(mobile) if session.authenticated => {
                    let roles: Vec<String> =
                        session.roles.iter().map(|r| r.to_string()).collect();
                    println!("Logged in as {} (roles: {})", mobile, roles.join(", "));
                }
                _ => println!("Not logged in."),
            }
            for panel in visible_panels(&session) {
                println!("  {:?}", panel);
            }
        }
        Commands::Ads => {
            refresh_listing(&mut view, &client).await;
        }
        Commands::Ad { id } => match client.get_advertisement(id).await {
            Ok(ad) => print_fragments(&render_advertisements(
                std::slice::from_ref(&ad),
                &client.session(),
            )),
            Err(e) => notify(&mut view, &e.to_string(), NoticeKind::Error),
        },
        Commands::CreateAd {
            make,
            model,
            year,
            color,
            status,
            title,
            description,
            price,
        } => {
            if open_panel(&mut view, Section::CreateAd, &client) {
                let ad = NewAdvertisement {
                    car: NewCar {
                        make,
                        model,
                        year,
                        color,
                        status,
                    },
                    title,
                    description,
                    price,
                };
                match client.create_advertisement(&ad).await {
                    Ok(_) => {
                        notify(
                            &mut view,
                            "Advertisement created successfully!",
                            NoticeKind::Success,
                        );
                        refresh_listing(&mut view, &client).await;
                    }
                    Err(e) => notify(&mut view, &e.to_string(), NoticeKind::Error),
                }
            }
        }
        Commands::EditAd {
            id,
            title,
            description,
            price,
            status,
        } => {
            let update = AdvertisementUpdate {
                title,
                description,
                price,
                status,
            };
            match client.update_advertisement(id, &update).await {
                Ok(_) => {
                    notify(&mut view, "Advertisement updated.", NoticeKind::Success);
                    refresh_listing(&mut view, &client).await;
                }
                Err(e) => notify(&mut view, &e.to_string(), NoticeKind::Error),
            }
        }
        Commands::DeleteAd { id } => {
            if delete_ad(&mut view, &client, id).await {
                refresh_listing(&mut view, &client).await;
            }
        }
        Commands::Search {
            min_price,
            max_price,
            brand,
            color,
            status,
        } => {
            if open_panel(&mut view, Section::AdvancedSearch, &client) {
                let filters = SearchFilters {
                    min_price,
                    max_price,
                    brand,
                    color,
                    status,
                };
                match client.search_cars(&filters).await {
                    Ok(cars) => {
                        view.show(Section::SearchResults, &client.session()).ok();
                        print_fragments(&render_cars(&cars, &client.session()));
                    }
                    Err(e) => notify(&mut view, &e.to_string(), NoticeKind::Error),
                }
            }
        }
        Commands::Cars => match client.list_cars().await {
            Ok(cars) => print_fragments(&render_cars(&cars, &client.session())),
            Err(e) => notify(&mut view, &e.to_string(), NoticeKind::Error),
        },
        Commands::Related { car_id } => match client.related_cars(car_id).await {
            Ok(cars) => {
                view.show(Section::RelatedCars, &client.session()).ok();
                print_fragments(&render_cars(&cars, &client.session()));
            }
            Err(e) => notify(&mut view, &e.to_string(), NoticeKind::Error),
        },
        Commands::Users => {
            if open_panel(&mut view, Section::UserManagement, &client) {
                match client.list_users().await {
                    Ok(users) => {
                        print_fragments(&render_users(&users, &client.session()))
                    }
                    Err(e) => notify(&mut view, &e.to_string(), NoticeKind::Error),
                }
            }
        }
        Commands::Deactivate { user_id } => {
            if open_panel(&mut view, Section::UserManagement, &client) {
                match client.deactivate_user(user_id).await {
                    Ok(message) => notify(&mut view, &message, NoticeKind::Success),
                    Err(e) => notify(&mut view, &e.to_string(), NoticeKind::Error),
                }
            }
        }
        Commands::Transactions => {
            if open_panel(&mut view, Section::AllTransactions, &client) {
                match client.list_transactions().await {
                    Ok(txs) => {
                        print_fragments(&render_transactions(&txs, &client.session()))
                    }
                    Err(e) => notify(&mut view, &e.to_string(), NoticeKind::Error),
                }
            }
        }
        Commands::Buy { car_id, price } => {
            match client.create_transaction(car_id, price).await {
                Ok(res) => notify(&mut view, &res.message, NoticeKind::Success),
                Err(e) => notify(&mut view, &e.to_string(), NoticeKind::Error),
            }
        }
        Commands::TxStatus { id, status } => match parse_status(&status) {
            Some(new_status) => {
                match client.update_transaction_status(id, new_status).await {
                    Ok(message) => notify(&mut view, &message, NoticeKind::Success),
                    Err(e) => notify(&mut view, &e.to_string(), NoticeKind::Error),
                }
            }
            None => notify(
                &mut view,
                "Status must be 'accepted', 'rejected', or 'completed'.",
                NoticeKind::Error,
            ),
        },
    }

    Ok(())
}
