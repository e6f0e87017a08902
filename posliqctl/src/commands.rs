use super::{CliError, IOArgs, OutputArgs};
use clap::Subcommand;
use posliq_core::models::{
    GenerateOptions, Iccid, ImportId, MovementId, NewMovement, NewSalesCondition, OperationKind,
    Period, PreviewQuery, PreviewSort, RechargeRow, RedemptionStatus, ReportRow, SortDirection,
    Store,
};
use posliq_core::ports::{
    ConditionRepository, ConsolidationRepository, CrossingRepository, IdentityRepository,
    ImportRepository, LedgerRepository, LiquidationRepository, StoreRepository,
};
use posliq_sqlite::Db;
use rust_decimal::Decimal;

/// Sort key for the crossing view.
#[derive(Clone, Copy, Default, clap::ValueEnum)]
pub enum SortKey {
    /// By store display name
    #[default]
    Name,
    /// By point-of-sale code
    Idpos,
    /// By total exposure
    Total,
}

impl From<SortKey> for PreviewSort {
    fn from(value: SortKey) -> Self {
        match value {
            SortKey::Name => Self::Name,
            SortKey::Idpos => Self::Idpos,
            SortKey::Total => Self::Total,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload normalized operator-report rows (a JSON array) for a period
    ImportReports {
        #[command(flatten)]
        io: IOArgs,

        /// The billing period, as YYYY-MM
        #[arg(short, long)]
        period: Period,

        /// Free-form label recorded on the upload
        #[arg(short, long)]
        label: Option<String>,
    },

    /// Upload normalized recharge-feed rows (a JSON array) for a period
    ImportRecharges {
        #[command(flatten)]
        io: IOArgs,

        /// The billing period, as YYYY-MM
        #[arg(short, long)]
        period: Period,

        /// Free-form label recorded on the upload
        #[arg(short, long)]
        label: Option<String>,
    },

    /// Delete an upload and its rows while the period is still open
    DeleteImport {
        /// The import to delete
        import_id: ImportId,
    },

    /// Merge the raw rows of a period into one authoritative row per simcard
    Consolidate {
        /// The billing period, as YYYY-MM
        period: Period,
    },

    /// Register a point-of-sale store
    CreateStore {
        /// Point-of-sale code, unique across stores
        idpos: String,

        /// Display name
        name: String,
    },

    /// Activate or deactivate a store
    SetStoreActive {
        /// Point-of-sale code
        idpos: String,

        /// "true" to activate, "false" to deactivate
        active: bool,
    },

    /// Set the commercial terms for a simcard-period
    Condition {
        /// The simcard's ICCID, in any feed spelling
        iccid: String,

        /// Point-of-sale code of the selling store
        store: String,

        /// The governed period, as YYYY-MM
        period: Period,

        /// Residual percentage, applied raw in the multiplier
        percentage: Decimal,

        /// Agreed sale price, informational
        #[arg(long)]
        sale_price: Option<Decimal>,
    },

    /// Per-store crossing of paid and pending commissions for a period
    Preview {
        #[command(flatten)]
        output: OutputArgs,

        /// The billing period, as YYYY-MM
        period: Period,

        /// Substring match against store name or idpos
        #[arg(short, long)]
        search: Option<String>,

        /// Sort key
        #[arg(long, value_enum, default_value = "name")]
        sort: SortKey,

        /// Sort descending instead of ascending
        #[arg(long)]
        desc: bool,

        /// Zero-based page
        #[arg(long, default_value_t = 0)]
        page: usize,

        /// Page size
        #[arg(long, default_value_t = 50)]
        per_page: usize,
    },

    /// Generate the liquidation for one store and period
    Liquidate {
        #[command(flatten)]
        output: OutputArgs,

        /// Point-of-sale code
        store: String,

        /// The billing period, as YYYY-MM
        period: Period,

        /// Regenerate an already-liquidated period as a new version
        #[arg(long)]
        new_version: bool,

        /// Recorded as the liquidation's author
        #[arg(long, default_value = "posliqctl")]
        actor: String,
    },

    /// Liquidate several stores for a period, one transaction per store
    BulkLiquidate {
        #[command(flatten)]
        output: OutputArgs,

        /// The billing period, as YYYY-MM
        period: Period,

        /// Point-of-sale codes of the stores to liquidate
        #[arg(required = true)]
        stores: Vec<String>,

        /// Recorded as the liquidations' author
        #[arg(long, default_value = "posliqctl")]
        actor: String,
    },

    /// Current spendable balance of a store
    Balance {
        /// Point-of-sale code
        store: String,
    },

    /// Movement history of a store, newest first
    Movements {
        #[command(flatten)]
        output: OutputArgs,

        /// Point-of-sale code
        store: String,

        /// Zero-based page
        #[arg(long, default_value_t = 0)]
        page: usize,

        /// Page size
        #[arg(long, default_value_t = 50)]
        per_page: usize,
    },

    /// Record a manual adjustment movement
    Adjust {
        /// Point-of-sale code
        store: String,

        /// Signed amount; negative values debit the balance
        amount: Decimal,

        /// Human-readable justification
        #[arg(short, long)]
        description: String,

        /// Recorded as the movement's author
        #[arg(long, default_value = "posliqctl")]
        actor: String,
    },

    /// Void a ledger movement, excluding it from the balance
    VoidMovement {
        /// The movement to void
        movement_id: MovementId,

        /// Recorded in the operation log
        #[arg(long, default_value = "posliqctl")]
        actor: String,
    },

    /// Register a redemption request from the external workflow
    Redeem {
        /// Point-of-sale code
        store: String,

        /// Total value of the redeemed items
        value: Decimal,

        /// Workflow status: pending, approved, confirmed, delivered, cancelled
        #[arg(long, default_value = "pending")]
        status: RedemptionStatus,
    },

    /// Gap between operator-reported commission and paid totals for a period
    Gap {
        #[command(flatten)]
        output: OutputArgs,

        /// The billing period, as YYYY-MM
        period: Period,
    },
}

pub(crate) fn store_by_idpos(db: &Db, idpos: &str) -> anyhow::Result<Store> {
    db.find_store_by_idpos(idpos)?
        .ok_or_else(|| CliError::UnknownStore(idpos.to_owned()).into())
}

impl Commands {
    pub fn run(self, db: &Db) -> anyhow::Result<()> {
        match self {
            Commands::ImportReports { io, period, label } => {
                let rows: Vec<ReportRow> = serde_json::from_reader(io.read()?)?;
                let import = db.create_import(period, label.as_deref())?;
                let summary = db.ingest_report_rows(import.id, &rows)?;
                serde_json::to_writer_pretty(io.write()?, &summary)?;
            }
            Commands::ImportRecharges { io, period, label } => {
                let rows: Vec<RechargeRow> = serde_json::from_reader(io.read()?)?;
                let import = db.create_import(period, label.as_deref())?;
                let summary = db.ingest_recharge_rows(import.id, &rows)?;
                serde_json::to_writer_pretty(io.write()?, &summary)?;
            }
            Commands::DeleteImport { import_id } => {
                let deletion = db.delete_import(import_id)?.map_err(anyhow::Error::new)?;
                serde_json::to_writer_pretty(std::io::stdout().lock(), &deletion)?;
            }
            Commands::Consolidate { period } => {
                let summary = db.consolidate(period)?;
                serde_json::to_writer_pretty(std::io::stdout().lock(), &summary)?;
            }
            Commands::CreateStore { idpos, name } => {
                let store = db.create_store(&idpos, &name)?;
                serde_json::to_writer_pretty(std::io::stdout().lock(), &store)?;
            }
            Commands::SetStoreActive { idpos, active } => {
                let store = store_by_idpos(db, &idpos)?;
                db.set_store_active(store.id, active)?;
            }
            Commands::Condition {
                iccid,
                store,
                period,
                percentage,
                sale_price,
            } => {
                let store = store_by_idpos(db, &store)?;
                let iccid = Iccid::parse(&iccid)?;
                let simcard = db.resolve_simcard(&iccid, None)?;
                let condition = db.put_sales_condition(&NewSalesCondition {
                    simcard_id: simcard.id,
                    store_id: store.id,
                    period,
                    commission_percentage: percentage,
                    sale_price,
                })?;
                serde_json::to_writer_pretty(std::io::stdout().lock(), &condition)?;
            }
            Commands::Preview {
                output,
                period,
                search,
                sort,
                desc,
                page,
                per_page,
            } => {
                let query = PreviewQuery {
                    search,
                    sort: sort.into(),
                    direction: if desc {
                        SortDirection::Desc
                    } else {
                        SortDirection::Asc
                    },
                    page,
                    per_page,
                };
                let result = db.preview_period("posliqctl", period, &query)?;
                serde_json::to_writer_pretty(output.write()?, &result)?;
            }
            Commands::Liquidate {
                output,
                store,
                period,
                new_version,
                actor,
            } => {
                let store = store_by_idpos(db, &store)?;
                let summary = db
                    .generate_for_store(store.id, period, &actor, GenerateOptions { new_version })?
                    .map_err(anyhow::Error::new)?;
                serde_json::to_writer_pretty(output.write()?, &summary)?;
            }
            Commands::BulkLiquidate {
                output,
                period,
                stores,
                actor,
            } => {
                let store_ids = stores
                    .iter()
                    .map(|idpos| Ok(store_by_idpos(db, idpos)?.id))
                    .collect::<anyhow::Result<Vec<_>>>()?;
                let outcome = db.bulk_liquidate(&store_ids, period, &actor)?;
                serde_json::to_writer_pretty(output.write()?, &outcome)?;
            }
            Commands::Balance { store } => {
                let store = store_by_idpos(db, &store)?;
                let balance = db.get_balance(store.id)?;
                serde_json::to_writer_pretty(
                    std::io::stdout().lock(),
                    &serde_json::json!({ "idpos": store.idpos, "balance": balance }),
                )?;
            }
            Commands::Movements {
                output,
                store,
                page,
                per_page,
            } => {
                let store = store_by_idpos(db, &store)?;
                let movements = db.list_movements(store.id, page, per_page)?;
                serde_json::to_writer_pretty(output.write()?, &movements)?;
            }
            Commands::Adjust {
                store,
                amount,
                description,
                actor,
            } => {
                let store = store_by_idpos(db, &store)?;
                let movement = db.record_movement(&NewMovement {
                    store_id: store.id,
                    amount,
                    operation: OperationKind::Adjustment,
                    description,
                    source_ref: None,
                    created_by: actor,
                })?;
                serde_json::to_writer_pretty(std::io::stdout().lock(), &movement)?;
            }
            Commands::VoidMovement { movement_id, actor } => {
                if !db.void_movement(movement_id, &actor)? {
                    return Err(CliError::UnknownMovement(movement_id.to_string()).into());
                }
            }
            Commands::Redeem {
                store,
                value,
                status,
            } => {
                let store = store_by_idpos(db, &store)?;
                let redemption = db.create_redemption(store.id, value, status)?;
                serde_json::to_writer_pretty(std::io::stdout().lock(), &redemption)?;
            }
            Commands::Gap { output, period } => {
                let gap = db.period_gap(period)?;
                serde_json::to_writer_pretty(output.write()?, &gap)?;
            }
        }

        Ok(())
    }
}
