use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_service_offerings_table::Migration),
            Box::new(m20240101_000002_create_pricing_options_table::Migration),
            Box::new(m20240101_000003_create_addresses_table::Migration),
            Box::new(m20240101_000004_create_technicians_table::Migration),
            Box::new(m20240101_000005_create_bookings_table::Migration),
            Box::new(m20240101_000006_create_booking_contacts_table::Migration),
            Box::new(m20240101_000007_create_job_assignments_table::Migration),
            Box::new(m20240101_000008_create_reviews_table::Migration),
        ]
    }
}

mod m20240101_000001_create_service_offerings_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_service_offerings_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ServiceOfferings::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ServiceOfferings::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ServiceOfferings::Name).string().not_null())
                        .col(
                            ColumnDef::new(ServiceOfferings::Category)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ServiceOfferings::Description).string().null())
                        .col(
                            ColumnDef::new(ServiceOfferings::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(ServiceOfferings::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ServiceOfferings::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ServiceOfferings::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ServiceOfferings {
        Table,
        Id,
        Name,
        Category,
        Description,
        Active,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_pricing_options_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_pricing_options_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PricingOptions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PricingOptions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PricingOptions::ServiceId).uuid().not_null())
                        .col(ColumnDef::new(PricingOptions::Name).string().not_null())
                        .col(
                            ColumnDef::new(PricingOptions::BaseAmount)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PricingOptions::DurationMinutes)
                                .integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PricingOptions::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PricingOptions::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_pricing_options_service_id")
                        .table(PricingOptions::Table)
                        .col(PricingOptions::ServiceId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PricingOptions::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum PricingOptions {
        Table,
        Id,
        ServiceId,
        Name,
        BaseAmount,
        DurationMinutes,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000003_create_addresses_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_addresses_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Addresses::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Addresses::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Addresses::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(Addresses::Street).string().not_null())
                        .col(ColumnDef::new(Addresses::City).string().not_null())
                        .col(ColumnDef::new(Addresses::Region).string().null())
                        .col(ColumnDef::new(Addresses::Building).string().null())
                        .col(ColumnDef::new(Addresses::Apartment).string().null())
                        .col(ColumnDef::new(Addresses::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Addresses::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_addresses_customer_id")
                        .table(Addresses::Table)
                        .col(Addresses::CustomerId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Addresses::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Addresses {
        Table,
        Id,
        CustomerId,
        Street,
        City,
        Region,
        Building,
        Apartment,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000004_create_technicians_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_technicians_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Technicians::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Technicians::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Technicians::Name).string().not_null())
                        .col(ColumnDef::new(Technicians::Phone).string().null())
                        .col(ColumnDef::new(Technicians::Email).string().null())
                        .col(ColumnDef::new(Technicians::Status).string().not_null())
                        .col(
                            ColumnDef::new(Technicians::Specialties)
                                .string()
                                .not_null()
                                .default(""),
                        )
                        .col(
                            ColumnDef::new(Technicians::AssignedJobs)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Technicians::CompletedJobs)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Technicians::Rating).decimal().null())
                        .col(ColumnDef::new(Technicians::AdminRating).decimal().null())
                        .col(ColumnDef::new(Technicians::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Technicians::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Technicians::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Technicians {
        Table,
        Id,
        Name,
        Phone,
        Email,
        Status,
        Specialties,
        AssignedJobs,
        CompletedJobs,
        Rating,
        AdminRating,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000005_create_bookings_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_bookings_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Bookings::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Bookings::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Bookings::BookingNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Bookings::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(Bookings::ServiceId).uuid().not_null())
                        .col(ColumnDef::new(Bookings::PricingOptionId).uuid().null())
                        .col(ColumnDef::new(Bookings::AddressId).uuid().not_null())
                        .col(ColumnDef::new(Bookings::TechnicianId).uuid().null())
                        .col(ColumnDef::new(Bookings::PaymentId).uuid().null())
                        .col(ColumnDef::new(Bookings::Status).string().not_null())
                        .col(ColumnDef::new(Bookings::ScheduledDate).date().not_null())
                        .col(ColumnDef::new(Bookings::TimeSlot).string().not_null())
                        .col(
                            ColumnDef::new(Bookings::EstimatedPrice)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Bookings::FinalPrice).big_integer().null())
                        .col(
                            ColumnDef::new(Bookings::IsEmergency)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Bookings::Notes).string().null())
                        .col(ColumnDef::new(Bookings::InternalNotes).string().null())
                        .col(ColumnDef::new(Bookings::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Bookings::UpdatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Bookings::CompletedAt).timestamp().null())
                        .col(
                            ColumnDef::new(Bookings::Version)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_bookings_customer_id")
                        .table(Bookings::Table)
                        .col(Bookings::CustomerId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_bookings_technician_id")
                        .table(Bookings::Table)
                        .col(Bookings::TechnicianId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_bookings_status")
                        .table(Bookings::Table)
                        .col(Bookings::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Bookings::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Bookings {
        Table,
        Id,
        BookingNumber,
        CustomerId,
        ServiceId,
        PricingOptionId,
        AddressId,
        TechnicianId,
        PaymentId,
        Status,
        ScheduledDate,
        TimeSlot,
        EstimatedPrice,
        FinalPrice,
        IsEmergency,
        Notes,
        InternalNotes,
        CreatedAt,
        UpdatedAt,
        CompletedAt,
        Version,
    }
}

mod m20240101_000006_create_booking_contacts_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_booking_contacts_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(BookingContacts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(BookingContacts::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BookingContacts::BookingId)
                                .uuid()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(BookingContacts::Name).string().not_null())
                        .col(ColumnDef::new(BookingContacts::Phone).string().not_null())
                        .col(ColumnDef::new(BookingContacts::Email).string().null())
                        .col(
                            ColumnDef::new(BookingContacts::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(BookingContacts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum BookingContacts {
        Table,
        Id,
        BookingId,
        Name,
        Phone,
        Email,
        CreatedAt,
    }
}

mod m20240101_000007_create_job_assignments_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000007_create_job_assignments_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(JobAssignments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(JobAssignments::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(JobAssignments::BookingId).uuid().not_null())
                        .col(
                            ColumnDef::new(JobAssignments::TechnicianId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(JobAssignments::AssignedBy).uuid().not_null())
                        .col(ColumnDef::new(JobAssignments::Note).string().null())
                        .col(
                            ColumnDef::new(JobAssignments::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_job_assignments_booking_id")
                        .table(JobAssignments::Table)
                        .col(JobAssignments::BookingId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(JobAssignments::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum JobAssignments {
        Table,
        Id,
        BookingId,
        TechnicianId,
        AssignedBy,
        Note,
        CreatedAt,
    }
}

mod m20240101_000008_create_reviews_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000008_create_reviews_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Reviews::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Reviews::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Reviews::BookingId)
                                .uuid()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Reviews::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(Reviews::TechnicianId).uuid().not_null())
                        .col(ColumnDef::new(Reviews::ServiceId).uuid().not_null())
                        .col(
                            ColumnDef::new(Reviews::OverallRating)
                                .small_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Reviews::QualityRating)
                                .small_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Reviews::PunctualityRating)
                                .small_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Reviews::ProfessionalismRating)
                                .small_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Reviews::ValueRating)
                                .small_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Reviews::Comment).string().null())
                        .col(ColumnDef::new(Reviews::Positives).string().null())
                        .col(ColumnDef::new(Reviews::Improvements).string().null())
                        .col(
                            ColumnDef::new(Reviews::Published)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Reviews::ModerationNotes).string().null())
                        .col(
                            ColumnDef::new(Reviews::Helpful)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Reviews::VerifiedJob)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Reviews::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Reviews::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_reviews_technician_id")
                        .table(Reviews::Table)
                        .col(Reviews::TechnicianId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_reviews_service_id")
                        .table(Reviews::Table)
                        .col(Reviews::ServiceId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Reviews::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Reviews {
        Table,
        Id,
        BookingId,
        CustomerId,
        TechnicianId,
        ServiceId,
        OverallRating,
        QualityRating,
        PunctualityRating,
        ProfessionalismRating,
        ValueRating,
        Comment,
        Positives,
        Improvements,
        Published,
        ModerationNotes,
        Helpful,
        VerifiedJob,
        CreatedAt,
        UpdatedAt,
    }
}
