//! The three exposed operations, wired to one backend.

use std::sync::Arc;

use crate::boot::{BootPayload, BootProvider};
use crate::config::Config;
use crate::context::Ctx;
use crate::csrf::{CsrfTokenResponse, TokenIssuer};
use crate::defaults::{Clock, DefaultResolvers, SystemClock};
use crate::document::NewDocument;
use crate::error::Error;
use crate::framework::{
    BootSource, DefaultsStore, DocumentHooks, MetaStore, NoHooks, PermissionEngine, SessionStore,
};
use crate::i18n::{Translator, Untranslated};
use crate::memory::MemoryFramework;
use crate::scaffold::DocumentScaffolder;
use crate::state::{Authed, Unauthed};
use crate::token::{RandomHashGenerator, TokenGenerator};

/// The framework collaborators the API runs against.
#[derive(Clone)]
pub struct Backend {
    /// Session-initialization lookup
    pub boot: Arc<dyn BootSource>,
    /// Schema lookups and listings
    pub meta: Arc<dyn MetaStore>,
    /// Permission engine
    pub permissions: Arc<dyn PermissionEngine>,
    /// User and system defaults
    pub defaults: Arc<dyn DefaultsStore>,
    /// Session persistence
    pub sessions: Arc<dyn SessionStore>,
}

impl Backend {
    /// Uses one in-memory framework for every collaborator.
    pub fn from_memory(framework: Arc<MemoryFramework>) -> Self {
        Self {
            boot: framework.clone(),
            meta: framework.clone(),
            permissions: framework.clone(),
            defaults: framework.clone(),
            sessions: framework,
        }
    }
}

/// Entry point for `get_boot`, `get_csrf_token` and `get_new_doc`.
///
/// ```
/// use std::sync::Arc;
/// use deskgate::memory::MemoryFramework;
/// use deskgate::{Api, Backend, Config};
///
/// let api = Api::builder(Config::default(), Backend::from_memory(Arc::new(MemoryFramework::new())))
///     .build();
/// assert_eq!(api.config().csrf.header, "X-Frappe-CSRF-Token");
/// ```
pub struct Api {
    config: Config,
    boot: BootProvider,
    tokens: TokenIssuer,
    scaffolder: DocumentScaffolder,
}

impl Api {
    /// Starts building an API over `backend`.
    pub fn builder(config: Config, backend: Backend) -> ApiBuilder {
        ApiBuilder {
            config,
            backend,
            clock: Arc::new(SystemClock),
            resolvers: DefaultResolvers::standard(),
            token_generator: None,
            hooks: Arc::new(NoHooks),
            translator: Arc::new(Untranslated),
        }
    }

    /// Boot data for the caller; guests get a minimal payload.
    pub fn get_boot(&self, ctx: &Ctx<Unauthed>) -> Result<BootPayload, Error> {
        self.boot.get_boot(ctx)
    }

    /// The caller's CSRF token, issued on first use.
    pub fn get_csrf_token(&self, ctx: &mut Ctx<Authed>) -> Result<CsrfTokenResponse, Error> {
        self.tokens.get_csrf_token(ctx)
    }

    /// A new, unsaved `doctype` document with defaults applied.
    pub fn get_new_doc(
        &self,
        ctx: &Ctx<Authed>,
        doctype: &str,
        with_mandatory_children: bool,
    ) -> Result<NewDocument, Error> {
        self.scaffolder
            .get_new_doc(ctx, doctype, with_mandatory_children)
    }

    /// Active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Builder for [`Api`].
pub struct ApiBuilder {
    config: Config,
    backend: Backend,
    clock: Arc<dyn Clock>,
    resolvers: DefaultResolvers,
    token_generator: Option<Arc<dyn TokenGenerator>>,
    hooks: Arc<dyn DocumentHooks>,
    translator: Arc<dyn Translator>,
}

impl ApiBuilder {
    /// Clock for date and time defaults.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sentinel default resolvers.
    pub fn resolvers(mut self, resolvers: DefaultResolvers) -> Self {
        self.resolvers = resolvers;
        self
    }

    /// Token source; defaults to random hex of the configured length.
    pub fn token_generator(mut self, generator: Arc<dyn TokenGenerator>) -> Self {
        self.token_generator = Some(generator);
        self
    }

    /// Post-construction document hooks.
    pub fn hooks(mut self, hooks: Arc<dyn DocumentHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Translator for user-facing messages.
    pub fn translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }

    /// Assembles the API.
    pub fn build(self) -> Api {
        let Self {
            config,
            backend,
            clock,
            resolvers,
            token_generator,
            hooks,
            translator,
        } = self;

        let generator = token_generator.unwrap_or_else(|| -> Arc<dyn TokenGenerator> {
            Arc::new(RandomHashGenerator::new(config.csrf.token_length))
        });

        Api {
            boot: BootProvider::new(backend.boot, backend.meta.clone(), &config.boot),
            tokens: TokenIssuer::new(generator, backend.sessions, config.in_test),
            scaffolder: DocumentScaffolder::new(
                backend.meta,
                backend.permissions,
                backend.defaults,
                hooks,
                translator,
                resolvers,
                clock,
            ),
            config,
        }
    }
}
