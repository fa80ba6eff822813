mod config;

use anyhow::{bail, Context, Result};
use board_core::{
    transitions::arrow_controls, DeliveryFilter, DragEnd, DragLocation, LocalityLookup,
    OrderDraft, Services, TransitionOutcome,
};
use clap::{Parser, Subcommand};
use shared::{
    domain::{
        CategoryId, DeliveryType, MenuItemId, NeighborhoodId, Order, OrderId, OrderStatus,
        PaymentMethod,
    },
    protocol::{MenuItemInput, NeighborhoodInput},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Kitchen order board client")]
struct Cli {
    /// Overrides `api_url` from board.toml and the environment.
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[arg(long, global = true)]
    postal_code_url: Option<String>,
    #[arg(long, global = true)]
    locality_url: Option<String>,
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Prints the three columns.
    Board {
        /// all, delivery, pickup/retirada or dinein/local.
        #[arg(long, default_value = "all")]
        filter: DeliveryFilter,
    },
    /// Moves an order one column to the right.
    Advance { order_id: i64 },
    /// Moves an order one column to the left.
    Back { order_id: i64 },
    /// Moves an order straight to any other column.
    Move { order_id: i64, status: OrderStatus },
    /// Replays a drop from one column position to another.
    Drag {
        from: OrderStatus,
        from_index: usize,
        to: OrderStatus,
        to_index: usize,
    },
    CreateOrder {
        #[arg(long)]
        customer: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        payment: PaymentMethod,
        #[arg(long, default_value = "local")]
        delivery_type: DeliveryType,
        /// `<category_id>:<item_id>[:<quantity>]`, repeatable.
        #[arg(long = "item", value_parser = parse_item_pick, required = true)]
        items: Vec<ItemPick>,
        #[arg(long)]
        neighborhood: Option<i64>,
        #[arg(long)]
        cep: Option<String>,
        #[arg(long)]
        street: Option<String>,
        #[arg(long)]
        number: Option<String>,
        #[arg(long)]
        complement: Option<String>,
        #[arg(long)]
        reference: Option<String>,
    },
    Menu,
    AddCategory { name: String },
    RenameCategory { category_id: i64, name: String },
    DeleteCategory { category_id: i64 },
    AddItem {
        category_id: i64,
        name: String,
        price: f64,
        #[arg(long)]
        description: Option<String>,
    },
    DeleteItem { category_id: i64, item_id: i64 },
    Neighborhoods {
        #[arg(long)]
        city: Option<String>,
    },
    AddNeighborhood {
        name: String,
        state: String,
        city: String,
        fee: f64,
        #[arg(long, allow_hyphen_values = true)]
        latitude: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        longitude: Option<f64>,
    },
    DeleteNeighborhood { neighborhood_id: i64 },
    /// Looks up a postal code.
    Cep { cep: String },
    States,
    Cities { state_id: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ItemPick {
    category_id: CategoryId,
    item_id: MenuItemId,
    quantity: u32,
}

fn parse_item_pick(raw: &str) -> Result<ItemPick, String> {
    let parts: Vec<&str> = raw.split(':').collect();
    let (category, item, quantity) = match parts.as_slice() {
        [category, item] => (*category, *item, "1"),
        [category, item, quantity] => (*category, *item, *quantity),
        _ => return Err(format!("expected <category_id>:<item_id>[:<quantity>], got '{raw}'")),
    };
    Ok(ItemPick {
        category_id: category.parse().map_err(|_| format!("bad category id '{category}'"))?,
        item_id: item.parse().map_err(|_| format!("bad item id '{item}'"))?,
        quantity: quantity
            .trim()
            .parse()
            .map_err(|_| format!("bad quantity '{quantity}'"))?,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    let mut settings = config::load_settings()?;
    if let Some(v) = cli.api_url {
        settings.api_url = v;
    }
    if let Some(v) = cli.postal_code_url {
        settings.postal_code_url = v;
    }
    if let Some(v) = cli.locality_url {
        settings.locality_url = v;
    }
    if let Some(v) = cli.timeout_secs {
        settings.request_timeout_secs = Some(v);
    }
    info!(api_url = %settings.api_url, "using backend");

    let services = Services::connect(&settings.client_settings())?;
    run(&services, cli.command).await
}

async fn run(services: &Services, command: Command) -> Result<()> {
    match command {
        Command::Board { filter } => {
            services.board.refresh().await?;
            print_board(services, filter).await;
        }
        Command::Advance { order_id } => {
            services.board.refresh().await?;
            let outcome = services.board.advance(OrderId(order_id)).await?;
            report_outcome(OrderId(order_id), outcome);
        }
        Command::Back { order_id } => {
            services.board.refresh().await?;
            let outcome = services.board.retreat(OrderId(order_id)).await?;
            report_outcome(OrderId(order_id), outcome);
        }
        Command::Move { order_id, status } => {
            services.board.refresh().await?;
            let outcome = services.board.move_to(OrderId(order_id), status).await?;
            report_outcome(OrderId(order_id), outcome);
        }
        Command::Drag {
            from,
            from_index,
            to,
            to_index,
        } => {
            services.board.refresh().await?;
            let order_id = services
                .board
                .store()
                .column(from)
                .await
                .get(from_index)
                .map(|order| order.id)
                .with_context(|| format!("no order at {} #{from_index}", from.label()))?;
            let outcome = services
                .board
                .drag_end(DragEnd {
                    source: DragLocation::new(from, from_index),
                    destination: Some(DragLocation::new(to, to_index)),
                })
                .await?;
            report_outcome(order_id, outcome);
        }
        Command::CreateOrder {
            customer,
            phone,
            payment,
            delivery_type,
            items,
            neighborhood,
            cep,
            street,
            number,
            complement,
            reference,
        } => {
            futures::future::try_join(services.menu.refresh(), services.neighborhoods.refresh())
                .await?;
            let categories = services.menu.categories().await;

            let mut draft = OrderDraft::new();
            draft.customer_name = customer;
            draft.customer_phone = phone;
            draft.payment_method = Some(payment);
            draft.delivery_type = Some(delivery_type);
            for pick in items {
                draft.add_from_menu(
                    &categories,
                    pick.category_id,
                    pick.item_id,
                    pick.quantity,
                )?;
            }

            if delivery_type == DeliveryType::Delivery {
                let Some(neighborhood_id) = neighborhood else {
                    bail!("delivery orders need --neighborhood");
                };
                let neighborhood = services
                    .neighborhoods
                    .get(NeighborhoodId(neighborhood_id))
                    .await
                    .with_context(|| format!("unknown neighborhood {neighborhood_id}"))?;
                draft.set_neighborhood(neighborhood);

                if let Some(cep) = cep {
                    draft.address.cep = cep.clone();
                    if street.is_none() {
                        let address = services.locality.lookup_postal_code(&cep).await?;
                        draft.address.fill_from_postal(&address);
                    }
                }
                if let Some(street) = street {
                    draft.address.street = street;
                }
                draft.address.number = number.unwrap_or_default();
                if let Some(complement) = complement {
                    draft.address.complement = complement;
                }
                draft.address.reference = reference.unwrap_or_default();
            }

            let order = services.board.create_order(&draft).await?;
            println!("created order #{} total R$ {:.2}", order.id, order.total_amount);
        }
        Command::Menu => {
            services.menu.refresh().await?;
            for category in services.menu.categories().await {
                println!("[{}] {}", category.id, category.name);
                for item in &category.items {
                    println!("    {:>4}  {:<30} R$ {:.2}", item.id, item.name, item.price);
                }
            }
        }
        Command::AddCategory { name } => {
            let category = services.menu.add_category(&name).await?;
            println!("created category {} ({})", category.id, category.name);
        }
        Command::RenameCategory { category_id, name } => {
            let category = services
                .menu
                .rename_category(CategoryId(category_id), &name)
                .await?;
            println!("category {} is now {}", category.id, category.name);
        }
        Command::DeleteCategory { category_id } => {
            services.menu.delete_category(CategoryId(category_id)).await?;
            println!("deleted category {category_id}");
        }
        Command::AddItem {
            category_id,
            name,
            price,
            description,
        } => {
            let item = services
                .menu
                .add_item(
                    CategoryId(category_id),
                    MenuItemInput {
                        name,
                        price,
                        description,
                    },
                )
                .await?;
            println!("created item {} in category {category_id}", item.id);
        }
        Command::DeleteItem {
            category_id,
            item_id,
        } => {
            services
                .menu
                .delete_item(CategoryId(category_id), MenuItemId(item_id))
                .await?;
            println!("deleted item {item_id}");
        }
        Command::Neighborhoods { city } => {
            let neighborhoods = match city {
                Some(city) => services.neighborhoods.in_city(&city).await?,
                None => {
                    services.neighborhoods.refresh().await?;
                    services.neighborhoods.neighborhoods().await
                }
            };
            for neighborhood in neighborhoods {
                println!(
                    "{:>4}  {:<25} {}/{}  R$ {:.2}",
                    neighborhood.id,
                    neighborhood.name,
                    neighborhood.city,
                    neighborhood.state,
                    neighborhood.delivery_fee
                );
            }
        }
        Command::AddNeighborhood {
            name,
            state,
            city,
            fee,
            latitude,
            longitude,
        } => {
            let neighborhood = services
                .neighborhoods
                .create(NeighborhoodInput {
                    name,
                    state,
                    city,
                    delivery_fee: fee,
                    latitude,
                    longitude,
                })
                .await?;
            println!("created neighborhood {}", neighborhood.id);
        }
        Command::DeleteNeighborhood { neighborhood_id } => {
            services
                .neighborhoods
                .delete(NeighborhoodId(neighborhood_id))
                .await?;
            println!("deleted neighborhood {neighborhood_id}");
        }
        Command::Cep { cep } => {
            let address = services.locality.lookup_postal_code(&cep).await?;
            println!("{}", serde_json::to_string_pretty(&address)?);
        }
        Command::States => {
            for state in services.locality.states().await? {
                println!("{:>3}  {}  {}", state.id, state.sigla, state.nome);
            }
        }
        Command::Cities { state_id } => {
            for city in services.locality.cities(state_id).await? {
                println!("{:>8}  {}", city.id, city.nome);
            }
        }
    }

    Ok(())
}

fn report_outcome(order_id: OrderId, outcome: TransitionOutcome) {
    match outcome {
        TransitionOutcome::Applied(status) => {
            println!("order #{order_id} moved to {}", status.label());
        }
        TransitionOutcome::Unchanged => println!("order #{order_id} unchanged"),
    }
}

async fn print_board(services: &Services, filter: DeliveryFilter) {
    let board = services.board.store().filtered(filter).await;
    for status in OrderStatus::ALL {
        let column = board.column(status);
        println!("== {} ({}) ==", status.label(), column.len());
        for order in column {
            print_card(order);
        }
        println!();
    }
}

fn print_card(order: &Order) {
    let time = order
        .order_date
        .map(|date| date.format("%d/%m %H:%M").to_string())
        .unwrap_or_default();
    let arrows: Vec<&str> = arrow_controls(order.status)
        .iter()
        .map(|control| control.tooltip)
        .collect();
    println!(
        "  #{} {} ({}) {} {}  R$ {:.2}  [{}]",
        order.id,
        order.customer_name,
        order.customer_phone,
        order.delivery_type,
        time,
        order.total_amount,
        arrows.join(" | ")
    );
    if let Some(address) = order.address_line() {
        println!("      {address}");
    }
    for item in &order.items {
        println!(
            "      {}x {}  R$ {:.2}",
            item.quantity,
            item.display_name(),
            item.line_total()
        );
    }
    if !order.has_consistent_total() {
        println!(
            "      ! total differs from items (expected R$ {:.2})",
            order.expected_total()
        );
    }
}
