// `async_trait`'s expansion of `MigrationTrait` rejects an explicit
// `SchemaManager<'_>` in the method signatures (E0195), so the crate-level
// rust_2018_idioms deny cannot apply to the elided lifetimes here.
#![allow(elided_lifetimes_in_paths)]

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240901_000001_create_rfq_tables::Migration),
            Box::new(m20240901_000002_create_reply_tables::Migration),
            Box::new(m20240901_000003_create_account_tables::Migration),
        ]
    }
}

// Migration implementations

mod m20240901_000001_create_rfq_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240901_000001_create_rfq_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Rfqs::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Rfqs::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Rfqs::RfqNumber).string().not_null())
                        .col(ColumnDef::new(Rfqs::Sequence).integer().not_null())
                        .col(ColumnDef::new(Rfqs::ProjectName).string().not_null())
                        .col(
                            ColumnDef::new(Rfqs::SubmissionDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Rfqs::Status).string().not_null())
                        .col(ColumnDef::new(Rfqs::CreatedBy).uuid().not_null())
                        .col(ColumnDef::new(Rfqs::Comments).string().not_null())
                        .col(ColumnDef::new(Rfqs::DrawingFileName).string())
                        .col(
                            ColumnDef::new(Rfqs::RequoteRequested)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Rfqs::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Rfqs::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_rfqs_rfq_number")
                        .table(Rfqs::Table)
                        .col(Rfqs::RfqNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_rfqs_status")
                        .table(Rfqs::Table)
                        .col(Rfqs::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(RfqParts::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(RfqParts::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(RfqParts::RfqId).uuid().not_null())
                        .col(ColumnDef::new(RfqParts::PartNo).string().not_null())
                        .col(ColumnDef::new(RfqParts::PartDescription).string().not_null())
                        .col(ColumnDef::new(RfqParts::DrawRevision).string().not_null())
                        .col(ColumnDef::new(RfqParts::OrderType).string().not_null())
                        .col(ColumnDef::new(RfqParts::Quantity).integer().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_rfq_parts_rfq")
                                .from(RfqParts::Table, RfqParts::RfqId)
                                .to(Rfqs::Table, Rfqs::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_rfq_parts_rfq_id")
                        .table(RfqParts::Table)
                        .col(RfqParts::RfqId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(RfqInvitations::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(RfqInvitations::RfqId).uuid().not_null())
                        .col(ColumnDef::new(RfqInvitations::SupplierId).uuid().not_null())
                        .col(
                            ColumnDef::new(RfqInvitations::RequoteRequested)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(RfqInvitations::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .primary_key(
                            Index::create()
                                .col(RfqInvitations::RfqId)
                                .col(RfqInvitations::SupplierId),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_rfq_invitations_rfq")
                                .from(RfqInvitations::Table, RfqInvitations::RfqId)
                                .to(Rfqs::Table, Rfqs::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(RfqCounters::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(RfqCounters::Prefix)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(RfqCounters::Sequence).integer().not_null())
                        .col(
                            ColumnDef::new(RfqCounters::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(RfqCounters::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(RfqInvitations::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(RfqParts::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Rfqs::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(Iden)]
    enum Rfqs {
        Table,
        Id,
        RfqNumber,
        Sequence,
        ProjectName,
        SubmissionDate,
        Status,
        CreatedBy,
        Comments,
        DrawingFileName,
        RequoteRequested,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum RfqParts {
        Table,
        Id,
        RfqId,
        PartNo,
        PartDescription,
        DrawRevision,
        OrderType,
        Quantity,
    }

    #[derive(Iden)]
    enum RfqInvitations {
        Table,
        RfqId,
        SupplierId,
        RequoteRequested,
        CreatedAt,
    }

    #[derive(Iden)]
    enum RfqCounters {
        Table,
        Prefix,
        Sequence,
        UpdatedAt,
    }
}

mod m20240901_000002_create_reply_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240901_000002_create_reply_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(SupplierReplies::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SupplierReplies::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SupplierReplies::RfqId).uuid().not_null())
                        .col(ColumnDef::new(SupplierReplies::RfqNumber).string().not_null())
                        .col(ColumnDef::new(SupplierReplies::SupplierId).uuid().not_null())
                        .col(
                            ColumnDef::new(SupplierReplies::SupplierName)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierReplies::SupplierType)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SupplierReplies::MsmeStatus).string().not_null())
                        .col(ColumnDef::new(SupplierReplies::Currency).string().not_null())
                        .col(ColumnDef::new(SupplierReplies::Status).string().not_null())
                        .col(
                            ColumnDef::new(SupplierReplies::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierReplies::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // One reply per (rfq, supplier); duplicates were possible in the
            // portal's first incarnation and are treated as an oversight.
            manager
                .create_index(
                    Index::create()
                        .name("idx_supplier_replies_rfq_supplier")
                        .table(SupplierReplies::Table)
                        .col(SupplierReplies::RfqId)
                        .col(SupplierReplies::SupplierId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ReplyRevisions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ReplyRevisions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ReplyRevisions::ReplyId).uuid().not_null())
                        .col(
                            ColumnDef::new(ReplyRevisions::RevisionNumber)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReplyRevisions::PaymentTerms)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReplyRevisions::DeliveryTerms)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReplyRevisions::FreightTerms)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ReplyRevisions::Remarks).string().not_null())
                        .col(
                            ColumnDef::new(ReplyRevisions::PaymentTermsChanged)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(ReplyRevisions::DeliveryTermsChanged)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(ReplyRevisions::FreightTermsChanged)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(ReplyRevisions::CostBreakupUrl).string())
                        .col(ColumnDef::new(ReplyRevisions::DrawingUrl).string())
                        .col(
                            ColumnDef::new(ReplyRevisions::SubmittedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_reply_revisions_reply")
                                .from(ReplyRevisions::Table, ReplyRevisions::ReplyId)
                                .to(SupplierReplies::Table, SupplierReplies::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_reply_revisions_reply_revision")
                        .table(ReplyRevisions::Table)
                        .col(ReplyRevisions::ReplyId)
                        .col(ReplyRevisions::RevisionNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(RevisionParts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(RevisionParts::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(RevisionParts::RevisionId).uuid().not_null())
                        .col(ColumnDef::new(RevisionParts::PartNo).string().not_null())
                        .col(
                            ColumnDef::new(RevisionParts::PartDescription)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(RevisionParts::Quantity).integer().not_null())
                        .col(ColumnDef::new(RevisionParts::OrderType).string().not_null())
                        .col(
                            ColumnDef::new(RevisionParts::UnitRate)
                                .decimal_len(16, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(RevisionParts::MaterialCost).decimal_len(16, 2))
                        .col(ColumnDef::new(RevisionParts::ProcessCost).decimal_len(16, 2))
                        .col(ColumnDef::new(RevisionParts::OverheadCost).decimal_len(16, 2))
                        .col(ColumnDef::new(RevisionParts::PackingCost).decimal_len(16, 2))
                        .col(ColumnDef::new(RevisionParts::ToolCost).decimal_len(16, 2))
                        .col(ColumnDef::new(RevisionParts::ToolLeadTime).integer())
                        .col(ColumnDef::new(RevisionParts::ToolCavity).integer())
                        .col(ColumnDef::new(RevisionParts::ToolLife).integer())
                        .col(
                            ColumnDef::new(RevisionParts::SampleLeadTime)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RevisionParts::ProductionLeadTime)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RevisionParts::TotalCost)
                                .decimal_len(16, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RevisionParts::UnitRateChanged)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(RevisionParts::MaterialCostChanged)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(RevisionParts::ProcessCostChanged)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(RevisionParts::OverheadCostChanged)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(RevisionParts::PackingCostChanged)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(RevisionParts::LeadTimeChanged)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_revision_parts_revision")
                                .from(RevisionParts::Table, RevisionParts::RevisionId)
                                .to(ReplyRevisions::Table, ReplyRevisions::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_revision_parts_revision_id")
                        .table(RevisionParts::Table)
                        .col(RevisionParts::RevisionId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(RevisionParts::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ReplyRevisions::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(SupplierReplies::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(Iden)]
    enum SupplierReplies {
        Table,
        Id,
        RfqId,
        RfqNumber,
        SupplierId,
        SupplierName,
        SupplierType,
        MsmeStatus,
        Currency,
        Status,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum ReplyRevisions {
        Table,
        Id,
        ReplyId,
        RevisionNumber,
        PaymentTerms,
        DeliveryTerms,
        FreightTerms,
        Remarks,
        PaymentTermsChanged,
        DeliveryTermsChanged,
        FreightTermsChanged,
        CostBreakupUrl,
        DrawingUrl,
        SubmittedAt,
    }

    #[derive(Iden)]
    enum RevisionParts {
        Table,
        Id,
        RevisionId,
        PartNo,
        PartDescription,
        Quantity,
        OrderType,
        UnitRate,
        MaterialCost,
        ProcessCost,
        OverheadCost,
        PackingCost,
        ToolCost,
        ToolLeadTime,
        ToolCavity,
        ToolLife,
        SampleLeadTime,
        ProductionLeadTime,
        TotalCost,
        UnitRateChanged,
        MaterialCostChanged,
        ProcessCostChanged,
        OverheadCostChanged,
        PackingCostChanged,
        LeadTimeChanged,
    }
}

mod m20240901_000003_create_account_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240901_000003_create_account_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Users::Email).string().not_null())
                        .col(ColumnDef::new(Users::Name).string().not_null())
                        .col(ColumnDef::new(Users::Role).string().not_null())
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Users::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_users_email")
                        .table(Users::Table)
                        .col(Users::Email)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Suppliers::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Suppliers::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Suppliers::Email).string().not_null())
                        .col(ColumnDef::new(Suppliers::Name).string().not_null())
                        .col(ColumnDef::new(Suppliers::VendorId).string().not_null())
                        .col(ColumnDef::new(Suppliers::Phone).string())
                        .col(ColumnDef::new(Suppliers::Country).string())
                        .col(ColumnDef::new(Suppliers::Location).string())
                        .col(ColumnDef::new(Suppliers::Category).string())
                        .col(ColumnDef::new(Suppliers::SubCategory).string())
                        .col(ColumnDef::new(Suppliers::SupplierType).string().not_null())
                        .col(ColumnDef::new(Suppliers::MsmeStatus).string().not_null())
                        .col(
                            ColumnDef::new(Suppliers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Suppliers::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_suppliers_email")
                        .table(Suppliers::Table)
                        .col(Suppliers::Email)
                        .unique()
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Suppliers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(Iden)]
    enum Users {
        Table,
        Id,
        Email,
        Name,
        Role,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum Suppliers {
        Table,
        Id,
        Email,
        Name,
        VendorId,
        Phone,
        Country,
        Location,
        Category,
        SubCategory,
        SupplierType,
        MsmeStatus,
        CreatedAt,
        UpdatedAt,
    }
}
