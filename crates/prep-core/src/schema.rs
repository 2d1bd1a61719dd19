//! The fixed questionnaire: fields, prompts and option sets.
//!
//! Field order is the persisted column order. Option strings are data: they
//! are written to storage verbatim and must never be reworded in place, since
//! historical rows would stop matching their option set.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use strum::{EnumCount, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::{Error, Result};

/// Header name of the server-assigned submission time column.
pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// `strftime` format of the persisted timestamp column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Separator used to join the selections of a multi-choice field.
pub const MULTI_CHOICE_SEPARATOR: &str = ", ";

// ─── Fields ──────────────────────────────────────────────────────────────────

/// One survey question. The strum serialisation is the CSV header name.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  EnumCount,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
pub enum Field {
  #[strum(serialize = "Conhecimento_PrEP")]
  PrepKnowledge,
  #[strum(serialize = "Conhecimento_PEP")]
  PepKnowledge,
  #[strum(serialize = "Acesso_servicos")]
  ServiceAccess,
  #[strum(serialize = "Fonte_informacao")]
  InformationSource,
  #[strum(serialize = "Uso_PrepPEP")]
  Usage,
  #[strum(serialize = "Conhece_usuarios")]
  KnowsUsers,
  #[strum(serialize = "Teste_HIV_frequencia")]
  TestFrequency,
  #[strum(serialize = "Metodos_prevencao")]
  PreventionMethods,
  #[strum(serialize = "Genero")]
  Gender,
  #[strum(serialize = "Orientacao_sexual")]
  SexualOrientation,
  #[strum(serialize = "Raca")]
  Race,
  #[strum(serialize = "Faixa_etaria")]
  AgeBand,
  #[strum(serialize = "Renda")]
  Income,
  #[strum(serialize = "Regiao")]
  Region,
}

/// How a field is presented on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
  Radio,
  Select,
  MultiSelect,
}

/// Which part of the form a field belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
  Knowledge,
  Experience,
  Demographics,
}

impl Section {
  pub const ALL: [Section; 3] =
    [Section::Knowledge, Section::Experience, Section::Demographics];

  pub fn title(self) -> &'static str {
    match self {
      Section::Knowledge => "Parte 1: Conhecimento sobre PrEP/PEP",
      Section::Experience => "Parte 2: Experiência Pessoal",
      Section::Demographics => "Parte 3: Perfil Demográfico",
    }
  }
}

const KNOWLEDGE: &[&str] = &[
  "Sim, conheço bem",
  "Conheço parcialmente",
  "Já ouvi falar mas não sei detalhes",
  "Não conheço",
];

const ACCESS: &[&str] = &[
  "Sim, conheço vários serviços",
  "Conheço apenas um local",
  "Não sei mas gostaria de saber",
  "Não sei e não tenho interesse",
];

const SOURCE: &[&str] = &[
  "Profissional de saúde",
  "Amigos/conhecidos",
  "Internet/redes sociais",
  "Material informativo (folhetos, cartazes)",
  "Nunca ouvi falar",
  "Outra fonte",
];

const USAGE: &[&str] = &[
  "Sim, uso atualmente",
  "Sim, já usei no passado",
  "Não, mas pretendo usar",
  "Não uso e não tenho interesse",
  "Prefiro não responder",
];

const KNOWS_USERS: &[&str] = &[
  "Sim, vários conhecidos",
  "Sim, algumas pessoas",
  "Não conheço ninguém",
  "Prefiro não responder",
];

const TEST_FREQUENCY: &[&str] = &[
  "A cada 3 meses",
  "A cada 6 meses",
  "Uma vez por ano",
  "Raramente faço",
  "Nunca fiz",
  "Prefiro não responder",
];

const PREVENTION: &[&str] = &[
  "PrEP",
  "PEP",
  "Camisinha masculina",
  "Camisinha feminina",
  "Testagem regular",
  "Não utilizo métodos de prevenção",
  "Outro",
];

const GENDER: &[&str] = &[
  "Mulher cisgênero",
  "Homem cisgênero",
  "Mulher trans/transgênero",
  "Homem trans/transgênero",
  "Pessoa não-binária",
  "Travesti",
  "Agênero",
  "Gênero fluido",
  "Outro",
  "Prefiro não responder",
];

const ORIENTATION: &[&str] = &[
  "Assexual",
  "Bissexual",
  "Gay",
  "Lésbica",
  "Pansexual",
  "Heterossexual",
  "Queer",
  "Outra",
  "Prefiro não responder",
];

const RACE: &[&str] = &[
  "Amarela (origem asiática)",
  "Branca",
  "Indígena",
  "Parda",
  "Preta",
  "Prefiro não responder",
];

const AGE_BAND: &[&str] = &[
  "13-17",
  "18-24",
  "25-29",
  "30-39",
  "40-49",
  "50-59",
  "60+",
  "Prefiro não responder",
];

const INCOME: &[&str] = &[
  "Até 1 salário mínimo",
  "1-2 salários mínimos",
  "2-3 salários mínimos",
  "3-5 salários mínimos",
  "Mais de 5 salários mínimos",
  "Prefiro não responder",
];

const REGION: &[&str] = &[
  "Centro expandido",
  "Zona Norte",
  "Zona Sul",
  "Zona Leste",
  "Zona Oeste",
  "Região Metropolitana",
  "Não moro em São Paulo",
  "Prefiro não responder",
];

impl Field {
  /// All fields in persisted column order.
  pub fn all() -> impl Iterator<Item = Field> { Field::iter() }

  /// The CSV header name, also used as the JSON key.
  pub fn column(self) -> &'static str { self.into() }

  /// Look a field up by its CSV header name.
  pub fn from_column(name: &str) -> Option<Field> { name.parse().ok() }

  /// Zero-based column position in the persisted table.
  pub fn index(self) -> usize { self as usize }

  pub fn is_multi_choice(self) -> bool {
    matches!(self, Field::PreventionMethods)
  }

  pub fn input_kind(self) -> InputKind {
    match self {
      Field::PreventionMethods => InputKind::MultiSelect,
      Field::Gender | Field::SexualOrientation | Field::Region => {
        InputKind::Select
      }
      _ => InputKind::Radio,
    }
  }

  pub fn section(self) -> Section {
    match self {
      Field::PrepKnowledge
      | Field::PepKnowledge
      | Field::ServiceAccess
      | Field::InformationSource => Section::Knowledge,
      Field::Usage
      | Field::KnowsUsers
      | Field::TestFrequency
      | Field::PreventionMethods => Section::Experience,
      _ => Section::Demographics,
    }
  }

  /// The question as shown on the form.
  pub fn prompt(self) -> &'static str {
    match self {
      Field::PrepKnowledge => {
        "Você conhece a PrEP (Profilaxia Pré-Exposição)?"
      }
      Field::PepKnowledge => "E a PEP (Profilaxia Pós-Exposição)?",
      Field::ServiceAccess => {
        "Você sabe onde conseguir PrEP/PEP em São Paulo?"
      }
      Field::InformationSource => "Como você ficou sabendo sobre PrEP/PEP?",
      Field::Usage => "Você já usou ou usa PrEP/PEP?",
      Field::KnowsUsers => "Conhece alguém que usa ou já usou PrEP/PEP?",
      Field::TestFrequency => "Com que frequência você faz teste de HIV?",
      Field::PreventionMethods => {
        "Quais métodos de prevenção ao HIV você utiliza?"
      }
      Field::Gender => "Identidade de gênero:",
      Field::SexualOrientation => "Orientação sexual:",
      Field::Race => "Raça/Cor:",
      Field::AgeBand => "Faixa etária:",
      Field::Income => "Renda mensal individual:",
      Field::Region => "Região de São Paulo onde mora:",
    }
  }

  /// The fixed option set, in display order.
  pub fn options(self) -> &'static [&'static str] {
    match self {
      Field::PrepKnowledge | Field::PepKnowledge => KNOWLEDGE,
      Field::ServiceAccess => ACCESS,
      Field::InformationSource => SOURCE,
      Field::Usage => USAGE,
      Field::KnowsUsers => KNOWS_USERS,
      Field::TestFrequency => TEST_FREQUENCY,
      Field::PreventionMethods => PREVENTION,
      Field::Gender => GENDER,
      Field::SexualOrientation => ORIENTATION,
      Field::Race => RACE,
      Field::AgeBand => AGE_BAND,
      Field::Income => INCOME,
      Field::Region => REGION,
    }
  }

  /// Position of `value` in this field's option set.
  pub fn option_index(self, value: &str) -> Option<usize> {
    self.options().iter().position(|o| *o == value)
  }

  /// Validate a single selection against the option set.
  pub fn check_option(self, value: &str) -> Result<()> {
    match self.option_index(value) {
      Some(_) => Ok(()),
      None => Err(Error::InvalidOption {
        field: self,
        value: value.to_owned(),
      }),
    }
  }
}

impl fmt::Display for Field {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.column())
  }
}

impl Serialize for Field {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(self.column())
  }
}

impl<'de> Deserialize<'de> for Field {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let name = String::deserialize(deserializer)?;
    Field::from_column(&name)
      .ok_or_else(|| de::Error::custom(format!("unknown field: {name:?}")))
  }
}

/// The full persisted header: every field column followed by `timestamp`.
pub fn header() -> Vec<&'static str> {
  Field::all()
    .map(Field::column)
    .chain(std::iter::once(TIMESTAMP_COLUMN))
    .collect()
}

/// Number of persisted columns, including `timestamp`.
pub const COLUMN_COUNT: usize = Field::COUNT + 1;
