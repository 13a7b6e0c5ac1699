//! # Police Client
//!
//! The shared police department directory and the proximity searches over
//! it. Directory reads are not user-scoped and stay fresh for several
//! minutes; department management is restricted to admins by the backend.

use crate::error::AppError;
use crate::keys::{
    DEPARTMENTS_NEAR_ADDRESS, NEAREST_ADDRESSES, NEAREST_DEPARTMENT, POLICE_DEPARTMENTS,
    POLICE_STALE_TIME,
};
use crate::model::{
    AddressMatch, Coordinates, DepartmentId, NearbyDepartment, PoliceDepartment,
    PoliceDepartmentDraft,
};
use crate::session::{Read, Session};
use crate::validate::{self, MAX_NAME_LEN};
use actor_cache::KeyFilter;
use tracing::{info, instrument};

#[derive(Clone)]
pub struct PoliceClient {
    session: Session,
}

impl PoliceClient {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    #[instrument(skip(self))]
    pub async fn get_all_police_departments(&self) -> Result<Vec<PoliceDepartment>, AppError> {
        let read = Read::shared(POLICE_DEPARTMENTS).stale_time(POLICE_STALE_TIME);
        self.session
            .read(read, |actor| async move {
                actor.get_all_police_departments().await
            })
            .await
    }

    #[instrument(skip(self))]
    pub async fn find_nearest_police_department(
        &self,
        location: Option<Coordinates>,
    ) -> Result<Option<NearbyDepartment>, AppError> {
        let location = location.map(validate::coordinates).transpose()?;
        let read = Read::shared(NEAREST_DEPARTMENT)
            .required(location.map(|at| format!("{:.5},{:.5}", at.latitude, at.longitude)))
            .stale_time(POLICE_STALE_TIME);
        self.session
            .read(read, |actor| async move {
                match location {
                    Some(location) => actor.find_nearest_police_department(location).await,
                    None => Ok(None),
                }
            })
            .await
    }

    /// Address suggestions for a search string. Blank input disables the read.
    #[instrument(skip(self))]
    pub async fn get_nearest_addresses(&self, query: &str) -> Result<Vec<AddressMatch>, AppError> {
        let query = validate::optional_text(Some(query.to_string()));
        let read = Read::shared(NEAREST_ADDRESSES)
            .required(query.as_deref())
            .stale_time(POLICE_STALE_TIME);
        self.session
            .read(read, |actor| async move {
                match query {
                    Some(query) => actor.get_nearest_addresses(query).await,
                    None => Ok(Vec::new()),
                }
            })
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_nearest_police_departments_to_address(
        &self,
        address: &str,
    ) -> Result<Vec<NearbyDepartment>, AppError> {
        let address = validate::optional_text(Some(address.to_string()));
        let read = Read::shared(DEPARTMENTS_NEAR_ADDRESS)
            .required(address.as_deref())
            .stale_time(POLICE_STALE_TIME);
        self.session
            .read(read, |actor| async move {
                match address {
                    Some(address) => actor.get_nearest_police_departments_to_address(address).await,
                    None => Ok(Vec::new()),
                }
            })
            .await
    }

    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn save_police_department(
        &self,
        draft: PoliceDepartmentDraft,
    ) -> Result<DepartmentId, AppError> {
        self.session.require_identity()?;
        let draft = clean_draft(draft)?;

        let id = self
            .session
            .mutate("save_police_department", |actor| async move {
                actor.save_police_department(draft).await
            })
            .await?;
        self.invalidate_directory().await?;
        info!(%id, "Police department saved");
        Ok(id)
    }

    #[instrument(skip(self, draft))]
    pub async fn update_police_department(
        &self,
        id: DepartmentId,
        draft: PoliceDepartmentDraft,
    ) -> Result<(), AppError> {
        self.session.require_identity()?;
        let draft = clean_draft(draft)?;

        self.session
            .mutate("update_police_department", |actor| async move {
                actor.update_police_department(id, draft).await
            })
            .await?;
        self.invalidate_directory().await?;
        info!(%id, "Police department updated");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_police_department(&self, id: DepartmentId) -> Result<(), AppError> {
        self.session.require_identity()?;

        self.session
            .mutate("delete_police_department", |actor| async move {
                actor.delete_police_department(id).await
            })
            .await?;
        self.invalidate_directory().await?;
        info!(%id, "Police department deleted");
        Ok(())
    }

    // Any directory change can alter every proximity result.
    async fn invalidate_directory(&self) -> Result<(), AppError> {
        for scope in [
            POLICE_DEPARTMENTS,
            NEAREST_DEPARTMENT,
            NEAREST_ADDRESSES,
            DEPARTMENTS_NEAR_ADDRESS,
        ] {
            self.session.invalidate(KeyFilter::scope(scope)).await?;
        }
        Ok(())
    }
}

fn clean_draft(draft: PoliceDepartmentDraft) -> Result<PoliceDepartmentDraft, AppError> {
    Ok(PoliceDepartmentDraft {
        name: validate::required_text("Department name", &draft.name, MAX_NAME_LEN)?,
        address: validate::required_text("Address", &draft.address, MAX_NAME_LEN)?,
        phone: validate::optional_text(draft.phone),
        email: validate::optional_text(draft.email),
        location: validate::coordinates(draft.location)?,
    })
}
